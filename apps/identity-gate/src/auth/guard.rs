// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role-based access decisions.

use super::claims::ClaimSet;
use super::roles::RoleRequirement;

/// Decide whether a verified caller satisfies `required`.
///
/// - An empty requirement admits every verified caller.
/// - Otherwise the caller needs at least one of the required roles under
///   `roles_claim`. A missing claim counts as holding no roles.
/// - Without a configured roles claim nothing but an empty requirement passes.
pub fn authorize(claims: &ClaimSet, required: &RoleRequirement, roles_claim: Option<&str>) -> bool {
    if required.is_empty() {
        return true;
    }
    let Some(roles_claim) = roles_claim else {
        return false;
    };
    claims
        .roles(roles_claim)
        .into_iter()
        .any(|role| required.contains(role))
}
