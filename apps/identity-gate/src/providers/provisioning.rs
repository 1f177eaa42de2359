// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account provisioning: create an account, then give it a role.
//!
//! The three steps run in order and each is its own remote call:
//!
//! 1. create the account
//! 2. resolve the role id from its exact name
//! 3. assign the role to the new account
//!
//! Nothing is rolled back. When step 2 or 3 fails the account exists without
//! the intended role, and [`ProvisioningError::PartiallyProvisioned`] carries
//! the account together with the failed step so an operator can finish or
//! remove it by hand.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::error::ManagementError;
use super::management::{ManagementClient, ProvisionedAccount};
use crate::auth::Role;

/// A step of [`ProvisioningWorkflow::create_user_with_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProvisioningStep {
    CreateAccount,
    ResolveRole,
    AssignRole,
}

impl ProvisioningStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisioningStep::CreateAccount => "create_account",
            ProvisioningStep::ResolveRole => "resolve_role",
            ProvisioningStep::AssignRole => "assign_role",
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProvisioningError {
    /// Step 1 failed; nothing was created.
    #[error("Account creation failed: {0}")]
    AccountCreation(ManagementError),

    /// The account exists but has not been given its role.
    #[error("Account {} created but {step} failed: {source}", account.id)]
    PartiallyProvisioned {
        account: Box<ProvisionedAccount>,
        step: ProvisioningStep,
        source: ManagementError,
    },
}

impl ProvisioningError {
    pub fn failed_step(&self) -> ProvisioningStep {
        match self {
            ProvisioningError::AccountCreation(_) => ProvisioningStep::CreateAccount,
            ProvisioningError::PartiallyProvisioned { step, .. } => *step,
        }
    }

    /// The underlying management API failure.
    pub fn management_error(&self) -> &ManagementError {
        match self {
            ProvisioningError::AccountCreation(source)
            | ProvisioningError::PartiallyProvisioned { source, .. } => source,
        }
    }

    /// The account left behind by a partial failure.
    pub fn orphaned_account(&self) -> Option<&ProvisionedAccount> {
        match self {
            ProvisioningError::AccountCreation(_) => None,
            ProvisioningError::PartiallyProvisioned { account, .. } => Some(account),
        }
    }
}

pub struct ProvisioningWorkflow {
    management: Arc<ManagementClient>,
}

impl ProvisioningWorkflow {
    pub fn new(management: Arc<ManagementClient>) -> Self {
        Self { management }
    }

    pub fn management(&self) -> &ManagementClient {
        &self.management
    }

    /// Create an account for `email` and assign it `role`.
    pub async fn create_user_with_role(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<ProvisionedAccount, ProvisioningError> {
        let account = self
            .management
            .create_user(email, password)
            .await
            .map_err(ProvisioningError::AccountCreation)?;

        let role_id = match self.management.get_role_id_by_name(role.as_str()).await {
            Ok(role_id) => role_id,
            Err(source) => return Err(partial(account, ProvisioningStep::ResolveRole, source)),
        };

        if let Err(source) = self
            .management
            .assign_roles(&account.id, std::slice::from_ref(&role_id))
            .await
        {
            return Err(partial(account, ProvisioningStep::AssignRole, source));
        }

        info!(email, account_id = %account.id, role = %role, "Provisioned account");
        Ok(account)
    }
}

fn partial(
    account: ProvisionedAccount,
    step: ProvisioningStep,
    source: ManagementError,
) -> ProvisioningError {
    warn!(
        account_id = %account.id,
        email = %account.email,
        %step,
        error = %source,
        retryable = source.is_retryable(),
        "Account created without its role; manual reconciliation required"
    );
    ProvisioningError::PartiallyProvisioned {
        account: Box::new(account),
        step,
        source,
    }
}
