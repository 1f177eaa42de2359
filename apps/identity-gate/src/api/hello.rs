// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role-gated greeting endpoints, one per role.

use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{policy, ClaimSet, Guarded, Operation, Role};

pub struct HelloAdmin;
pub struct HelloManager;
pub struct HelloUser;

impl Operation for HelloAdmin {
    const ID: &'static str = policy::HELLO_ADMIN;
}

impl Operation for HelloManager {
    const ID: &'static str = policy::HELLO_MANAGER;
}

impl Operation for HelloUser {
    const ID: &'static str = policy::HELLO_USER;
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HelloResponse {
    pub message: String,
    pub role: Role,
    pub user_id: String,
}

fn greet(role: Role, claims: &ClaimSet) -> HelloResponse {
    HelloResponse {
        message: format!("Hello, {role}!"),
        role,
        user_id: claims.subject().unwrap_or_default().to_string(),
    }
}

#[utoipa::path(
    get,
    path = "/v1/hello/admin",
    tag = "Hello",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Greeting for admins", body = HelloResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
    )
)]
pub async fn hello_admin(Guarded { claims, .. }: Guarded<HelloAdmin>) -> Json<HelloResponse> {
    Json(greet(Role::Admin, &claims))
}

#[utoipa::path(
    get,
    path = "/v1/hello/manager",
    tag = "Hello",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Greeting for managers", body = HelloResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Manager role required"),
    )
)]
pub async fn hello_manager(Guarded { claims, .. }: Guarded<HelloManager>) -> Json<HelloResponse> {
    Json(greet(Role::Manager, &claims))
}

#[utoipa::path(
    get,
    path = "/v1/hello/user",
    tag = "Hello",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Greeting for users", body = HelloResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "User role required"),
    )
)]
pub async fn hello_user(Guarded { claims, .. }: Guarded<HelloUser>) -> Json<HelloResponse> {
    Json(greet(Role::User, &claims))
}
