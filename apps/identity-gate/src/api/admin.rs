// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin-only API endpoints.
//!
//! These endpoints require the Admin role and provision accounts at the
//! identity provider.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::{policy, Guarded, Operation, Role},
    error::ApiError,
    providers::ProvisionedAccount,
    state::AppState,
};

pub struct AdminUsersCreate;

impl Operation for AdminUsersCreate {
    const ID: &'static str = policy::ADMIN_USERS_CREATE;
}

/// Request to create an account with a role.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    /// One of `admin`, `manager`, `user`.
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub account: ProvisionedAccount,
    pub role: Role,
}

impl CreateUserRequest {
    fn validate(&self) -> Result<Role, ApiError> {
        let valid_email = self
            .email
            .trim()
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !valid_email {
            return Err(ApiError::bad_request("email must be a valid address"));
        }
        if self.password.is_empty() {
            return Err(ApiError::bad_request("password must not be empty"));
        }
        self.role
            .parse::<Role>()
            .map_err(|e| ApiError::bad_request(e.to_string()))
    }
}

/// Create an account at the identity provider and assign it a role.
///
/// The account is not removed when the role step fails; the 502 response
/// then names the account and the failed step.
#[utoipa::path(
    post,
    path = "/v1/admin/users",
    tag = "Admin",
    security(("bearer" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created with role", body = CreateUserResponse),
        (status = 400, description = "Malformed body or invalid email, password or role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Account already exists"),
        (status = 500, description = "Management API not configured"),
        (status = 502, description = "Identity provider failure, possibly after the account was created"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Guarded { claims, .. }: Guarded<AdminUsersCreate>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    let Json(request) = payload?;
    let role = request.validate()?;
    let email = request.email.trim();

    info!(
        admin = claims.subject().unwrap_or_default(),
        email,
        %role,
        "Provisioning account"
    );

    let account = state
        .provisioning
        .create_user_with_role(email, &request.password, role)
        .await?;

    Ok((StatusCode::CREATED, Json(CreateUserResponse { account, role })))
}
