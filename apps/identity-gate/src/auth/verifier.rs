// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bearer token verification.
//!
//! A token is accepted only when all of the following hold:
//!
//! 1. Its header names the configured algorithm (no downgrade to `HS*` or
//!    `none`) and carries a key id.
//! 2. The key id resolves through the [`KeyResolver`].
//! 3. The signature verifies with that key.
//! 4. `iss` equals the configured issuer and `aud` contains the configured
//!    audience exactly.
//! 5. `exp` is in the future, with no leeway unless one is configured.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde_json::{Map, Value};
use tracing::debug;

use super::claims::ClaimSet;
use super::error::AuthError;
use super::jwks::KeyResolver;
use crate::clock::Clock;
use crate::config::{AuthSettings, AUTH0_AUDIENCE_ENV, AUTH0_ISSUER_URL_ENV};

/// Verifies bearer tokens issued by the identity provider.
pub struct TokenVerifier {
    issuer: Option<String>,
    audience: Option<String>,
    algorithm: jsonwebtoken::Algorithm,
    leeway: u64,
    keys: Option<Arc<KeyResolver>>,
}

impl TokenVerifier {
    /// Build a verifier from settings. Without an issuer domain no key
    /// resolver exists and every verification fails with a configuration error.
    pub fn new(settings: &AuthSettings, client: reqwest::Client, clock: Arc<dyn Clock>) -> Self {
        let keys = settings.jwks_url().map(|url| {
            Arc::new(
                KeyResolver::new(client, url, settings.algorithm, clock)
                    .with_default_ttl(settings.jwks_cache_ttl)
                    .with_requests_per_minute(settings.jwks_requests_per_minute),
            )
        });

        Self {
            issuer: settings.issuer(),
            audience: settings.audience.clone(),
            algorithm: settings.algorithm,
            leeway: settings.clock_skew_secs,
            keys,
        }
    }

    pub fn key_resolver(&self) -> Option<&Arc<KeyResolver>> {
        self.keys.as_ref()
    }

    /// Verify the token carried in an `Authorization` header value.
    pub async fn verify_header(&self, authorization: Option<&str>) -> Result<ClaimSet, AuthError> {
        let token = extract_bearer(authorization)?;
        self.verify(token).await
    }

    /// Verify a raw compact JWT and return its claims.
    pub async fn verify(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let result = self.verify_inner(token).await;
        if let Err(ref e) = result {
            debug!(error_code = e.error_code(), "Token rejected");
        }
        result
    }

    async fn verify_inner(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let issuer = self
            .issuer
            .as_deref()
            .ok_or(AuthError::Configuration(AUTH0_ISSUER_URL_ENV))?;
        let audience = self
            .audience
            .as_deref()
            .ok_or(AuthError::Configuration(AUTH0_AUDIENCE_ENV))?;
        let keys = self
            .keys
            .as_ref()
            .ok_or(AuthError::Configuration(AUTH0_ISSUER_URL_ENV))?;

        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != self.algorithm {
            return Err(AuthError::DisallowedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.as_deref().ok_or(AuthError::MalformedToken)?;

        let decoding_key = keys.resolve_key(kid).await?;

        let mut validation = Validation::new(self.algorithm);
        validation.leeway = self.leeway;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = decode::<Map<String, Value>>(token, &decoding_key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
                ErrorKind::InvalidIssuer => AuthError::IssuerMismatch,
                ErrorKind::InvalidAudience => AuthError::AudienceMismatch,
                ErrorKind::InvalidAlgorithm => {
                    AuthError::DisallowedAlgorithm(format!("{:?}", header.alg))
                }
                _ => AuthError::MalformedToken,
            })?;

        Ok(ClaimSet::new(token_data.claims))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
///
/// The scheme is matched case-insensitively.
pub fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let value = authorization.ok_or(AuthError::MissingToken)?.trim();
    let (scheme, token) = value
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token.trim())
}
