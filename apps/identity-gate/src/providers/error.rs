// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Errors of the identity provider's management API.

/// Failure of a management API call or of the credential it needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManagementError {
    #[error("Management API configuration missing: {0}")]
    MissingConfig(&'static str),

    #[error("Management API configuration invalid: {0}")]
    InvalidConfig(&'static str),

    #[error("Management API authentication failed: {0}")]
    AuthFailed(String),

    #[error("Management API request failed: {0}")]
    Network(String),

    #[error("Management API response was invalid: {0}")]
    InvalidResponse(String),

    #[error("User with email {0} already exists")]
    Conflict(String),

    #[error("Failed to create user: {0}")]
    CreateFailed(String),

    #[error("Role '{0}' not found")]
    RoleNotFound(String),

    #[error("Failed to look up role: {0}")]
    RoleLookupFailed(String),

    #[error("Failed to assign role: {0}")]
    AssignFailed(String),

    #[error("Failed to list user roles: {0}")]
    RoleListFailed(String),
}

impl ManagementError {
    /// Whether repeating the same call may succeed.
    ///
    /// Transport failures and a rejected credential grant are transient.
    /// Business outcomes (conflict, unknown role) and missing configuration
    /// are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ManagementError::AuthFailed(_) | ManagementError::Network(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ManagementError::MissingConfig(_) => "management_not_configured",
            ManagementError::InvalidConfig(_) => "management_misconfigured",
            ManagementError::AuthFailed(_) => "management_auth_failed",
            ManagementError::Network(_) => "management_unreachable",
            ManagementError::InvalidResponse(_) => "management_invalid_response",
            ManagementError::Conflict(_) => "user_exists",
            ManagementError::CreateFailed(_) => "user_create_failed",
            ManagementError::RoleNotFound(_) => "role_not_found",
            ManagementError::RoleLookupFailed(_) => "role_lookup_failed",
            ManagementError::AssignFailed(_) => "role_assign_failed",
            ManagementError::RoleListFailed(_) => "role_list_failed",
        }
    }
}
