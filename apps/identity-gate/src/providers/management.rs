// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client for the identity provider's management API (`/api/v2`).

use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use url::Url;
use utoipa::ToSchema;

use super::credential::{required, ManagementTokenCache};
use super::error::ManagementError;
use crate::config::{base_url, ManagementSettings, AUTH0_DOMAIN_ENV};

/// Account created at the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProvisionedAccount {
    #[serde(alias = "user_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub connection: String,
}

/// Role defined at the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RemoteRole {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub struct ManagementClient {
    api_domain: Option<String>,
    connection: String,
    tokens: Arc<ManagementTokenCache>,
    http: Client,
}

impl ManagementClient {
    pub fn new(settings: &ManagementSettings, tokens: Arc<ManagementTokenCache>, http: Client) -> Self {
        Self {
            api_domain: settings.api_domain.clone(),
            connection: settings.connection.clone(),
            tokens,
            http,
        }
    }

    /// Create a password account in the configured connection.
    ///
    /// A duplicate email is reported as [`ManagementError::Conflict`].
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
    ) -> Result<ProvisionedAccount, ManagementError> {
        let url = self.endpoint(&["users"])?;
        let token = self.tokens.get_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&json!({
                "email": email,
                "password": password,
                "connection": self.connection,
                "email_verified": false,
            }))
            .send()
            .await
            .map_err(|e| ManagementError::Network(format!("POST /users failed: {e}")))?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            warn!(email, "Account already exists");
            return Err(ManagementError::Conflict(email.to_string()));
        }
        if !status.is_success() {
            self.discard_rejected_token(status).await;
            let body = response.text().await.unwrap_or_default();
            warn!(email, %status, "Account creation failed");
            return Err(ManagementError::CreateFailed(format!(
                "POST /users returned {status}: {body}"
            )));
        }

        let mut account: ProvisionedAccount = response.json().await.map_err(|e| {
            ManagementError::InvalidResponse(format!("POST /users invalid JSON: {e}"))
        })?;
        if account.connection.is_empty() {
            account.connection = self.connection.clone();
        }

        info!(email, account_id = %account.id, "Created account");
        Ok(account)
    }

    /// Id of the role named exactly `name`.
    ///
    /// The provider's `name_filter` is a substring match, so the result is
    /// filtered again for an exact name.
    pub async fn get_role_id_by_name(&self, name: &str) -> Result<String, ManagementError> {
        let mut url = self.endpoint(&["roles"])?;
        url.query_pairs_mut().append_pair("name_filter", name);
        let token = self.tokens.get_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ManagementError::Network(format!("GET /roles failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            self.discard_rejected_token(status).await;
            let body = response.text().await.unwrap_or_default();
            return Err(ManagementError::RoleLookupFailed(format!(
                "GET /roles returned {status}: {body}"
            )));
        }

        let roles: Vec<RemoteRole> = response.json().await.map_err(|e| {
            ManagementError::InvalidResponse(format!("GET /roles invalid JSON: {e}"))
        })?;

        let role = roles
            .into_iter()
            .find(|role| role.name == name)
            .ok_or_else(|| ManagementError::RoleNotFound(name.to_string()))?;

        info!(role = name, role_id = %role.id, "Resolved role");
        Ok(role.id)
    }

    /// Add `role_ids` to the roles of `user_id`.
    pub async fn assign_roles(&self, user_id: &str, role_ids: &[String]) -> Result<(), ManagementError> {
        let url = self.endpoint(&["users", user_id, "roles"])?;
        let token = self.tokens.get_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&json!({ "roles": role_ids }))
            .send()
            .await
            .map_err(|e| ManagementError::Network(format!("POST /users/roles failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            self.discard_rejected_token(status).await;
            let body = response.text().await.unwrap_or_default();
            warn!(user_id, %status, "Role assignment failed");
            return Err(ManagementError::AssignFailed(format!(
                "POST /users/roles returned {status}: {body}"
            )));
        }

        info!(user_id, ?role_ids, "Assigned roles");
        Ok(())
    }

    /// Roles currently assigned to `user_id`.
    pub async fn list_user_roles(&self, user_id: &str) -> Result<Vec<RemoteRole>, ManagementError> {
        let url = self.endpoint(&["users", user_id, "roles"])?;
        let token = self.tokens.get_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ManagementError::Network(format!("GET /users/roles failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            self.discard_rejected_token(status).await;
            let body = response.text().await.unwrap_or_default();
            return Err(ManagementError::RoleListFailed(format!(
                "GET /users/roles returned {status}: {body}"
            )));
        }

        response.json().await.map_err(|e| {
            ManagementError::InvalidResponse(format!("GET /users/roles invalid JSON: {e}"))
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ManagementError> {
        let domain = required(&self.api_domain, AUTH0_DOMAIN_ENV)?;
        let mut url = Url::parse(&base_url(domain)).map_err(|e| {
            warn!(domain, error = %e, "Management domain is not a valid URL");
            ManagementError::InvalidConfig(AUTH0_DOMAIN_ENV)
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                warn!(domain, "Management domain cannot carry a path");
                ManagementError::InvalidConfig(AUTH0_DOMAIN_ENV)
            })?
            .pop_if_empty()
            .extend(["api", "v2"])
            .extend(segments);
        Ok(url)
    }

    async fn discard_rejected_token(&self, status: StatusCode) {
        if status == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
    }
}
