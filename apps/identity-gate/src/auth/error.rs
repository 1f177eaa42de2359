// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Broad class of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCategory {
    /// A required setting is missing.
    Configuration,
    /// The presented token is unacceptable. Never retried.
    Token,
    /// Signing keys could not be resolved.
    KeyResolution,
    /// The caller is authenticated but lacks a required role.
    Authorization,
}

/// Why a key-set fetch did not produce keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyFetchError {
    #[error("JWKS request failed: {0}")]
    Request(String),
    #[error("JWKS endpoint returned HTTP {0}")]
    Status(u16),
    #[error("JWKS response was invalid: {0}")]
    InvalidResponse(String),
    #[error("JWKS fetch rate limit reached")]
    RateLimited,
}

/// Authentication error type.
///
/// Every failure of verification or authorization maps to exactly one
/// variant with a stable [`error_code`](AuthError::error_code), so callers
/// can choose a response without inspecting messages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header with a bearer token is required")]
    MissingToken,
    #[error("Invalid authorization header format (expected 'Bearer <token>')")]
    InvalidAuthHeader,
    #[error("Token is malformed")]
    MalformedToken,
    #[error("Token algorithm {0} is not accepted")]
    DisallowedAlgorithm(String),
    #[error("Token signature is invalid")]
    SignatureInvalid,
    #[error("Token issuer does not match")]
    IssuerMismatch,
    #[error("Token audience does not match")]
    AudienceMismatch,
    #[error("Token has expired")]
    Expired,
    #[error("No signing key matches the token key id")]
    KeyNotFound,
    #[error("Signing keys are unavailable: {0}")]
    KeyUnavailable(KeyFetchError),
    #[error("Authentication is not configured: {0} is missing")]
    Configuration(&'static str),
    #[error("Insufficient permissions for this operation")]
    InsufficientPermissions,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::MalformedToken => "malformed_token",
            AuthError::DisallowedAlgorithm(_) => "disallowed_algorithm",
            AuthError::SignatureInvalid => "invalid_signature",
            AuthError::IssuerMismatch => "invalid_issuer",
            AuthError::AudienceMismatch => "invalid_audience",
            AuthError::Expired => "token_expired",
            AuthError::KeyNotFound => "no_matching_key",
            AuthError::KeyUnavailable(_) => "verification_unavailable",
            AuthError::Configuration(_) => "auth_not_configured",
            AuthError::InsufficientPermissions => "insufficient_permissions",
        }
    }

    pub fn category(&self) -> AuthErrorCategory {
        match self {
            AuthError::Configuration(_) => AuthErrorCategory::Configuration,
            AuthError::KeyNotFound | AuthError::KeyUnavailable(_) => {
                AuthErrorCategory::KeyResolution
            }
            AuthError::InsufficientPermissions => AuthErrorCategory::Authorization,
            AuthError::MissingToken
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::DisallowedAlgorithm(_)
            | AuthError::SignatureInvalid
            | AuthError::IssuerMismatch
            | AuthError::AudienceMismatch
            | AuthError::Expired => AuthErrorCategory::Token,
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidAuthHeader
            | AuthError::MalformedToken
            | AuthError::DisallowedAlgorithm(_)
            | AuthError::SignatureInvalid
            | AuthError::IssuerMismatch
            | AuthError::AudienceMismatch
            | AuthError::Expired
            | AuthError::KeyNotFound => StatusCode::UNAUTHORIZED,
            AuthError::InsufficientPermissions => StatusCode::FORBIDDEN,
            AuthError::KeyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
