// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role requirements per operation.
//!
//! Every guarded operation is identified by a stable string id and looked up
//! here at dispatch time. An id without an entry is denied.

use std::collections::HashMap;

use super::roles::{Role, RoleRequirement};

pub const USERS_ME: &str = "users.me";
pub const HELLO_ADMIN: &str = "hello.admin";
pub const HELLO_MANAGER: &str = "hello.manager";
pub const HELLO_USER: &str = "hello.user";
pub const ADMIN_USERS_CREATE: &str = "admin.users.create";

/// Lookup table from operation id to its role requirement.
#[derive(Debug, Clone, Default)]
pub struct OperationPolicy {
    requirements: HashMap<&'static str, RoleRequirement>,
}

impl OperationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the roles `operation` accepts, replacing any earlier entry.
    pub fn with(mut self, operation: &'static str, requirement: RoleRequirement) -> Self {
        self.requirements.insert(operation, requirement);
        self
    }

    pub fn requirement(&self, operation: &str) -> Option<&RoleRequirement> {
        self.requirements.get(operation)
    }

    /// Requirements of the operations served by this service.
    pub fn service_default() -> Self {
        Self::new()
            .with(USERS_ME, RoleRequirement::none())
            .with(HELLO_ADMIN, Role::Admin.into())
            .with(HELLO_MANAGER, Role::Manager.into())
            .with(HELLO_USER, Role::User.into())
            .with(ADMIN_USERS_CREATE, Role::Admin.into())
    }
}
