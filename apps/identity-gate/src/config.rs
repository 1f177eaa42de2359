// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values and the
//! settings structs loaded from them at startup. A `.env` file in the working
//! directory is honoured when present.
//!
//! Missing values never abort the process. Each operation checks the keys it
//! needs when it runs and fails with an error naming the missing key, so a
//! service without management credentials still verifies tokens.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `AUTH0_ISSUER_URL` | Issuer domain (issuer `https://{domain}/`, JWKS under `/.well-known/jwks.json`) | Required for verification |
//! | `AUTH0_AUDIENCE` | Expected `aud` claim | Required for verification |
//! | `AUTH0_ROLES_CLAIM` | Claim key holding the caller's roles | Unset (role checks deny) |
//! | `AUTH0_ALGORITHM` | Accepted asymmetric signing algorithm | `RS256` |
//! | `AUTH0_CLOCK_SKEW_SECS` | Leeway applied to `exp` | `0` |
//! | `AUTH0_JWKS_REQUESTS_PER_MINUTE` | JWKS fetch rate limit | `5` |
//! | `AUTH0_JWKS_CACHE_TTL_SECS` | JWKS TTL when the response has no `max-age` | `600` |
//! | `AUTH0_DOMAIN` | Management API domain (`/api/v2`) | Required for provisioning |
//! | `AUTH0_MGMT_DOMAIN` | Token endpoint domain (`/oauth/token`) | Required for provisioning |
//! | `AUTH0_MGMT_CLIENT_ID` | Management client id | Required for provisioning |
//! | `AUTH0_MGMT_CLIENT_SECRET` | Management client secret | Required for provisioning |
//! | `AUTH0_MGMT_AUDIENCE` | Management API audience | Required for provisioning |
//! | `AUTH0_MGMT_TOKEN_BUFFER_SECS` | Safety buffer before credential expiry | `300` |
//! | `AUTH0_CONNECTION` | Connection new accounts are created in | `Username-Password-Authentication` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use tracing::warn;

pub const AUTH0_ISSUER_URL_ENV: &str = "AUTH0_ISSUER_URL";
pub const AUTH0_AUDIENCE_ENV: &str = "AUTH0_AUDIENCE";
pub const AUTH0_ROLES_CLAIM_ENV: &str = "AUTH0_ROLES_CLAIM";
pub const AUTH0_ALGORITHM_ENV: &str = "AUTH0_ALGORITHM";
pub const AUTH0_CLOCK_SKEW_SECS_ENV: &str = "AUTH0_CLOCK_SKEW_SECS";
pub const AUTH0_JWKS_REQUESTS_PER_MINUTE_ENV: &str = "AUTH0_JWKS_REQUESTS_PER_MINUTE";
pub const AUTH0_JWKS_CACHE_TTL_SECS_ENV: &str = "AUTH0_JWKS_CACHE_TTL_SECS";

pub const AUTH0_DOMAIN_ENV: &str = "AUTH0_DOMAIN";
pub const AUTH0_MGMT_DOMAIN_ENV: &str = "AUTH0_MGMT_DOMAIN";
pub const AUTH0_MGMT_CLIENT_ID_ENV: &str = "AUTH0_MGMT_CLIENT_ID";
pub const AUTH0_MGMT_CLIENT_SECRET_ENV: &str = "AUTH0_MGMT_CLIENT_SECRET";
pub const AUTH0_MGMT_AUDIENCE_ENV: &str = "AUTH0_MGMT_AUDIENCE";
pub const AUTH0_MGMT_TOKEN_BUFFER_SECS_ENV: &str = "AUTH0_MGMT_TOKEN_BUFFER_SECS";
pub const AUTH0_CONNECTION_ENV: &str = "AUTH0_CONNECTION";

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::RS256;
pub const DEFAULT_JWKS_REQUESTS_PER_MINUTE: u32 = 5;
pub const DEFAULT_JWKS_CACHE_TTL: Duration = Duration::from_secs(600);
pub const DEFAULT_MGMT_TOKEN_BUFFER: Duration = Duration::from_secs(300);
pub const DEFAULT_CONNECTION: &str = "Username-Password-Authentication";
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Settings for inbound token verification and role checks.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Identity provider domain the tokens are issued by.
    pub issuer_domain: Option<String>,
    /// Expected `aud` value.
    pub audience: Option<String>,
    /// Claim key holding the caller's roles.
    pub roles_claim: Option<String>,
    /// The only algorithm accepted in token headers.
    pub algorithm: Algorithm,
    /// Leeway in seconds applied to `exp`.
    pub clock_skew_secs: u64,
    /// Upper bound on JWKS fetches per rolling minute.
    pub jwks_requests_per_minute: u32,
    /// JWKS lifetime when the endpoint does not advertise one.
    pub jwks_cache_ttl: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            issuer_domain: None,
            audience: None,
            roles_claim: None,
            algorithm: DEFAULT_ALGORITHM,
            clock_skew_secs: 0,
            jwks_requests_per_minute: DEFAULT_JWKS_REQUESTS_PER_MINUTE,
            jwks_cache_ttl: DEFAULT_JWKS_CACHE_TTL,
        }
    }
}

impl AuthSettings {
    pub fn from_env() -> Self {
        Self {
            issuer_domain: env_optional(AUTH0_ISSUER_URL_ENV),
            audience: env_optional(AUTH0_AUDIENCE_ENV),
            roles_claim: env_optional(AUTH0_ROLES_CLAIM_ENV),
            algorithm: algorithm_from_env(),
            clock_skew_secs: env_parse_or(AUTH0_CLOCK_SKEW_SECS_ENV, 0),
            jwks_requests_per_minute: env_parse_or(
                AUTH0_JWKS_REQUESTS_PER_MINUTE_ENV,
                DEFAULT_JWKS_REQUESTS_PER_MINUTE,
            ),
            jwks_cache_ttl: Duration::from_secs(env_parse_or(
                AUTH0_JWKS_CACHE_TTL_SECS_ENV,
                DEFAULT_JWKS_CACHE_TTL.as_secs(),
            )),
        }
    }

    /// Expected `iss` value, `https://{domain}/`.
    pub fn issuer(&self) -> Option<String> {
        self.issuer_domain
            .as_deref()
            .map(|domain| format!("{}/", base_url(domain)))
    }

    /// Published key-set location for the issuer.
    pub fn jwks_url(&self) -> Option<String> {
        self.issuer_domain
            .as_deref()
            .map(|domain| format!("{}/.well-known/jwks.json", base_url(domain)))
    }
}

/// Settings for the identity provider's management API.
#[derive(Debug, Clone)]
pub struct ManagementSettings {
    /// Domain serving `/api/v2`.
    pub api_domain: Option<String>,
    /// Domain serving `/oauth/token`.
    pub token_domain: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub audience: Option<String>,
    /// Credentials are refreshed this long before they expire.
    pub token_buffer: Duration,
    /// Connection new accounts are created in.
    pub connection: String,
}

impl Default for ManagementSettings {
    fn default() -> Self {
        Self {
            api_domain: None,
            token_domain: None,
            client_id: None,
            client_secret: None,
            audience: None,
            token_buffer: DEFAULT_MGMT_TOKEN_BUFFER,
            connection: DEFAULT_CONNECTION.to_string(),
        }
    }
}

impl ManagementSettings {
    pub fn from_env() -> Self {
        Self {
            api_domain: env_optional(AUTH0_DOMAIN_ENV),
            token_domain: env_optional(AUTH0_MGMT_DOMAIN_ENV),
            client_id: env_optional(AUTH0_MGMT_CLIENT_ID_ENV),
            client_secret: env_optional(AUTH0_MGMT_CLIENT_SECRET_ENV),
            audience: env_optional(AUTH0_MGMT_AUDIENCE_ENV),
            token_buffer: Duration::from_secs(env_parse_or(
                AUTH0_MGMT_TOKEN_BUFFER_SECS_ENV,
                DEFAULT_MGMT_TOKEN_BUFFER.as_secs(),
            )),
            connection: env_or_default(AUTH0_CONNECTION_ENV, DEFAULT_CONNECTION),
        }
    }

    /// Name of the first required key that is not set, if any.
    pub fn first_missing(&self) -> Option<&'static str> {
        [
            (AUTH0_DOMAIN_ENV, &self.api_domain),
            (AUTH0_MGMT_DOMAIN_ENV, &self.token_domain),
            (AUTH0_MGMT_CLIENT_ID_ENV, &self.client_id),
            (AUTH0_MGMT_CLIENT_SECRET_ENV, &self.client_secret),
            (AUTH0_MGMT_AUDIENCE_ENV, &self.audience),
        ]
        .into_iter()
        .find(|(_, value)| value.is_none())
        .map(|(name, _)| name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Bind address and logging.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

impl ServerSettings {
    pub fn from_env() -> Self {
        let log_format = match env_or_default(LOG_FORMAT_ENV, "pretty")
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Self {
            host: env_or_default(HOST_ENV, "0.0.0.0"),
            port: env_parse_or(PORT_ENV, 8080),
            log_format,
        }
    }
}

/// Base URL for a provider domain.
///
/// Bare domains are served over HTTPS. A value that already carries a
/// scheme is kept as-is so local mocks can be addressed over HTTP.
pub fn base_url(domain: &str) -> String {
    let domain = domain.trim().trim_end_matches('/');
    if domain.starts_with("https://") || domain.starts_with("http://") {
        domain.to_string()
    } else {
        format!("https://{domain}")
    }
}

fn algorithm_from_env() -> Algorithm {
    let Some(raw) = env_optional(AUTH0_ALGORITHM_ENV) else {
        return DEFAULT_ALGORITHM;
    };
    match Algorithm::from_str(&raw) {
        Ok(Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => {
            warn!(algorithm = %raw, "Symmetric algorithms are not accepted, using RS256");
            DEFAULT_ALGORITHM
        }
        Ok(algorithm) => algorithm,
        Err(_) => {
            warn!(algorithm = %raw, "Unknown signing algorithm, using RS256");
            DEFAULT_ALGORITHM
        }
    }
}

pub(crate) fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}

fn env_parse_or<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match env_optional(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, default = %default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        assert_eq!(base_url("tenant.auth0.com"), "https://tenant.auth0.com");
        assert_eq!(base_url("tenant.auth0.com/"), "https://tenant.auth0.com");
    }

    #[test]
    fn explicit_scheme_is_kept() {
        assert_eq!(base_url("http://127.0.0.1:9000/"), "http://127.0.0.1:9000");
    }

    #[test]
    fn issuer_and_jwks_url_derive_from_domain() {
        let settings = AuthSettings {
            issuer_domain: Some("tenant.auth0.com".to_string()),
            ..AuthSettings::default()
        };
        assert_eq!(settings.issuer().as_deref(), Some("https://tenant.auth0.com/"));
        assert_eq!(
            settings.jwks_url().as_deref(),
            Some("https://tenant.auth0.com/.well-known/jwks.json")
        );
    }

    #[test]
    fn unconfigured_issuer_has_no_urls() {
        let settings = AuthSettings::default();
        assert!(settings.issuer().is_none());
        assert!(settings.jwks_url().is_none());
    }

    #[test]
    fn first_missing_reports_in_order() {
        let mut settings = ManagementSettings::default();
        assert_eq!(settings.first_missing(), Some(AUTH0_DOMAIN_ENV));

        settings.api_domain = Some("tenant.auth0.com".to_string());
        settings.token_domain = Some("tenant.auth0.com".to_string());
        settings.client_id = Some("id".to_string());
        assert_eq!(settings.first_missing(), Some(AUTH0_MGMT_CLIENT_SECRET_ENV));

        settings.client_secret = Some("secret".to_string());
        settings.audience = Some("https://tenant.auth0.com/api/v2/".to_string());
        assert_eq!(settings.first_missing(), None);
    }

    #[test]
    fn defaults_match_documentation() {
        let auth = AuthSettings::default();
        assert_eq!(auth.algorithm, Algorithm::RS256);
        assert_eq!(auth.clock_skew_secs, 0);
        assert_eq!(auth.jwks_requests_per_minute, 5);

        let mgmt = ManagementSettings::default();
        assert_eq!(mgmt.token_buffer, Duration::from_secs(300));
        assert_eq!(mgmt.connection, "Username-Password-Authentication");
    }
}
