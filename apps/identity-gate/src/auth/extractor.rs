// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for verified and authorized callers.
//!
//! Use `Auth` when any verified caller may proceed, and `Guarded<O>` when the
//! handler belongs to a declared operation:
//!
//! ```rust,ignore
//! pub struct HelloAdmin;
//! impl Operation for HelloAdmin {
//!     const ID: &'static str = policy::HELLO_ADMIN;
//! }
//!
//! async fn hello_admin(Guarded { claims, .. }: Guarded<HelloAdmin>) -> impl IntoResponse {
//!     // claims hold a role accepted for `hello.admin`
//! }
//! ```

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use super::{authorize, AuthError, ClaimSet};
use crate::state::AppState;

/// Verified claims of the caller.
pub struct Auth(pub ClaimSet);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already verified earlier in this request
        if let Some(claims) = parts.extensions.get::<ClaimSet>().cloned() {
            return Ok(Auth(claims));
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AuthError::InvalidAuthHeader))
            .transpose()?;

        let claims = state.verifier.verify_header(header).await?;
        parts.extensions.insert(claims.clone());

        Ok(Auth(claims))
    }
}

/// An operation with an entry in the [`OperationPolicy`](super::OperationPolicy).
pub trait Operation {
    const ID: &'static str;
}

/// Verified claims of a caller allowed to perform operation `O`.
pub struct Guarded<O> {
    pub claims: ClaimSet,
    _operation: PhantomData<fn() -> O>,
}

impl<O: Operation> FromRequestParts<AppState> for Guarded<O> {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Auth(claims) = Auth::from_request_parts(parts, state).await?;

        let Some(required) = state.policy.requirement(O::ID) else {
            warn!(operation = O::ID, "No role requirement declared for operation; denying");
            return Err(AuthError::InsufficientPermissions);
        };

        if !required.is_empty() && state.roles_claim.is_none() {
            warn!(
                operation = O::ID,
                "Roles claim is not configured; denying role-restricted operation"
            );
        }

        if !authorize(&claims, required, state.roles_claim.as_deref()) {
            debug!(
                operation = O::ID,
                subject = claims.subject().unwrap_or_default(),
                required = ?required.roles(),
                "Caller lacks a required role"
            );
            return Err(AuthError::InsufficientPermissions);
        }

        Ok(Guarded {
            claims,
            _operation: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{policy, OperationPolicy, RoleRequirement};
    use crate::clock::SystemClock;
    use crate::config::ManagementSettings;
    use crate::testutil::{auth_settings, issuer, jwks_server, sign, valid_claims};
    use axum::http::Request;
    use serde_json::{json, Map};
    use std::sync::Arc;
    use wiremock::MockServer;

    struct HelloAdmin;
    impl Operation for HelloAdmin {
        const ID: &'static str = policy::HELLO_ADMIN;
    }

    struct UsersMe;
    impl Operation for UsersMe {
        const ID: &'static str = policy::USERS_ME;
    }

    struct Undeclared;
    impl Operation for Undeclared {
        const ID: &'static str = "products.delete";
    }

    fn state(server: &MockServer) -> AppState {
        AppState::new(
            &auth_settings(server),
            &ManagementSettings::default(),
            reqwest::Client::new(),
            Arc::new(SystemClock),
        )
    }

    fn parts(authorization: Option<String>) -> Parts {
        let mut builder = Request::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn bearer(server: &MockServer, roles: &[&str]) -> Option<String> {
        Some(format!("Bearer {}", sign(&valid_claims(&issuer(server), roles))))
    }

    #[tokio::test]
    async fn auth_requires_authorization_header() {
        let server = jwks_server().await;
        let result = Auth::from_request_parts(&mut parts(None), &state(&server)).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn auth_verifies_bearer_token() {
        let server = jwks_server().await;
        let mut parts = parts(bearer(&server, &[]));
        let Auth(claims) = Auth::from_request_parts(&mut parts, &state(&server))
            .await
            .unwrap();
        assert_eq!(claims.subject(), Some("auth0|user-1"));
        assert!(parts.extensions.get::<ClaimSet>().is_some());
    }

    #[tokio::test]
    async fn auth_prefers_extensions() {
        let server = MockServer::start().await;
        let mut parts = parts(None);
        let mut map = Map::new();
        map.insert("sub".to_string(), json!("already-verified"));
        parts.extensions.insert(ClaimSet::new(map));

        let Auth(claims) = Auth::from_request_parts(&mut parts, &state(&server))
            .await
            .unwrap();
        assert_eq!(claims.subject(), Some("already-verified"));
    }

    #[tokio::test]
    async fn guarded_admits_matching_role() {
        let server = jwks_server().await;
        let guarded =
            Guarded::<HelloAdmin>::from_request_parts(&mut parts(bearer(&server, &["admin"])), &state(&server))
                .await
                .unwrap();
        assert_eq!(guarded.claims.subject(), Some("auth0|user-1"));
    }

    #[tokio::test]
    async fn guarded_rejects_missing_role() {
        let server = jwks_server().await;
        let result =
            Guarded::<HelloAdmin>::from_request_parts(&mut parts(bearer(&server, &["user"])), &state(&server))
                .await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn guarded_open_operation_admits_any_verified_caller() {
        let server = jwks_server().await;
        let result =
            Guarded::<UsersMe>::from_request_parts(&mut parts(bearer(&server, &[])), &state(&server)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn guarded_denies_undeclared_operation() {
        let server = jwks_server().await;
        let result = Guarded::<Undeclared>::from_request_parts(
            &mut parts(bearer(&server, &["admin", "manager", "user"])),
            &state(&server),
        )
        .await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }

    #[tokio::test]
    async fn guarded_verifies_before_authorizing() {
        let server = jwks_server().await;
        let result =
            Guarded::<Undeclared>::from_request_parts(&mut parts(None), &state(&server)).await;
        assert!(matches!(result, Err(AuthError::MissingToken)));
    }

    #[tokio::test]
    async fn guarded_follows_custom_policy() {
        let server = jwks_server().await;
        let state = state(&server).with_policy(
            OperationPolicy::new().with(policy::HELLO_ADMIN, RoleRequirement::any_of(["user"])),
        );
        let result =
            Guarded::<HelloAdmin>::from_request_parts(&mut parts(bearer(&server, &["user"])), &state).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn guarded_denies_without_roles_claim_setting() {
        let server = jwks_server().await;
        let mut state = state(&server);
        state.roles_claim = None;
        let result =
            Guarded::<HelloAdmin>::from_request_parts(&mut parts(bearer(&server, &["admin"])), &state).await;
        assert!(matches!(result, Err(AuthError::InsufficientPermissions)));
    }
}
