// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Verified token claims.

use serde_json::{Map, Value};

/// Claims of a verified token.
///
/// Produced only by [`TokenVerifier`](super::TokenVerifier) after signature,
/// issuer, audience and expiry checks pass. The decoded payload is kept
/// unmodified and cannot be changed afterwards.
///
/// Handlers receive it through the [`Auth`](super::Auth) extractor and pass it
/// explicitly to anything downstream that needs the caller's identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimSet {
    claims: Map<String, Value>,
}

impl ClaimSet {
    pub(crate) fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Subject, the provider's user id.
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.claims.get("iss").and_then(Value::as_str)
    }

    /// Audiences the token was issued for. A single string is a one-element list.
    pub fn audiences(&self) -> Vec<&str> {
        string_or_list(self.claims.get("aud"))
    }

    /// Expiry as a Unix timestamp.
    pub fn expires_at(&self) -> Option<i64> {
        self.claims.get("exp").and_then(Value::as_i64)
    }

    /// Roles carried under `claim_key`. Absent or non-string entries yield nothing.
    pub fn roles(&self, claim_key: &str) -> Vec<&str> {
        string_or_list(self.claims.get(claim_key))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.claims
    }
}

fn string_or_list(value: Option<&Value>) -> Vec<&str> {
    match value {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}
