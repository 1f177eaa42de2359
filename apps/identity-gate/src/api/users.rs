// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User endpoints.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::auth::{policy, ClaimSet, Guarded, Operation};
use crate::state::AppState;

pub struct UsersMe;

impl Operation for UsersMe {
    const ID: &'static str = policy::USERS_ME;
}

/// Response for GET /v1/users/me
#[derive(Debug, Serialize, ToSchema)]
pub struct UserMeResponse {
    /// Subject of the verified token
    pub user_id: String,
    /// Roles listed under the configured roles claim
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Token expiry (unix seconds)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// All claims of the verified token
    #[schema(value_type = Object)]
    pub claims: Map<String, Value>,
}

impl UserMeResponse {
    fn from_claims(claims: &ClaimSet, roles_claim: Option<&str>) -> Self {
        Self {
            user_id: claims.subject().unwrap_or_default().to_string(),
            roles: roles_claim
                .map(|key| claims.roles(key).into_iter().map(str::to_string).collect())
                .unwrap_or_default(),
            issuer: claims.issuer().map(str::to_string),
            expires_at: claims.expires_at(),
            email: claims.get("email").and_then(Value::as_str).map(str::to_string),
            claims: claims.as_map().clone(),
        }
    }
}

/// Get the current authenticated user's information.
///
/// This endpoint returns the identity and roles of the currently authenticated user.
#[utoipa::path(
    get,
    path = "/v1/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User information", body = UserMeResponse),
        (status = 401, description = "Unauthorized - invalid or missing token"),
        (status = 503, description = "Signing keys unavailable"),
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Guarded { claims, .. }: Guarded<UsersMe>,
) -> Json<UserMeResponse> {
    Json(UserMeResponse::from_claims(&claims, state.roles_claim.as_deref()))
}
