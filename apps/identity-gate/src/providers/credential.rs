// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Management API credential acquisition and caching.
//!
//! The credential is obtained with a client-credentials grant and reused
//! while `now < expires_at - buffer`. Past that point it is discarded and a
//! new one is requested; a stale credential is never handed out.
//!
//! Acquisition is single-flight: concurrent callers that find no usable
//! credential queue behind one grant request and share its result, since the
//! provider rate-limits and bills per grant. Failures are returned to the
//! caller as-is; retrying is the caller's decision.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::error::ManagementError;
use crate::clock::{span, Clock};
use crate::config::{
    base_url, ManagementSettings, AUTH0_MGMT_AUDIENCE_ENV, AUTH0_MGMT_CLIENT_ID_ENV,
    AUTH0_MGMT_CLIENT_SECRET_ENV, AUTH0_MGMT_DOMAIN_ENV,
};

const TOKEN_PATH: &str = "/oauth/token";

/// An access token for the management API.
#[derive(Clone)]
pub struct ManagementCredential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl ManagementCredential {
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Expiry reported by the provider.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the credential may still be handed out at `now`.
    pub fn is_usable_at(&self, now: DateTime<Utc>, buffer: chrono::Duration) -> bool {
        self.expires_at
            .checked_sub_signed(buffer)
            .is_some_and(|deadline| now < deadline)
    }
}

impl std::fmt::Debug for ManagementCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagementCredential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Process-wide cache of the management API credential.
pub struct ManagementTokenCache {
    token_domain: Option<String>,
    client_id: Option<String>,
    client_secret: Option<String>,
    audience: Option<String>,
    buffer: chrono::Duration,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
    current: RwLock<Option<ManagementCredential>>,
    acquire: Mutex<()>,
}

impl ManagementTokenCache {
    pub fn new(settings: &ManagementSettings, http: reqwest::Client, clock: Arc<dyn Clock>) -> Self {
        Self {
            token_domain: settings.token_domain.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            audience: settings.audience.clone(),
            buffer: span(settings.token_buffer),
            clock,
            http,
            current: RwLock::new(None),
            acquire: Mutex::new(()),
        }
    }

    /// Get a usable management token, acquiring one if needed.
    pub async fn get_token(&self) -> Result<String, ManagementError> {
        if let Some(token) = self.usable_token().await {
            return Ok(token);
        }

        let _single_flight = self.acquire.lock().await;

        // Another caller may have acquired while we waited.
        if let Some(token) = self.usable_token().await {
            debug!("Reusing management credential acquired by a concurrent caller");
            return Ok(token);
        }

        self.current.write().await.take();

        let credential = self.request_credential().await?;
        let token = credential.token.clone();
        *self.current.write().await = Some(credential);
        Ok(token)
    }

    /// Drop the cached credential so the next call acquires a new one.
    pub async fn invalidate(&self) {
        self.current.write().await.take();
    }

    async fn usable_token(&self) -> Option<String> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|c| c.is_usable_at(self.clock.now(), self.buffer))
            .map(|c| c.token.clone())
    }

    async fn request_credential(&self) -> Result<ManagementCredential, ManagementError> {
        let domain = required(&self.token_domain, AUTH0_MGMT_DOMAIN_ENV)?;
        let client_id = required(&self.client_id, AUTH0_MGMT_CLIENT_ID_ENV)?;
        let client_secret = required(&self.client_secret, AUTH0_MGMT_CLIENT_SECRET_ENV)?;
        let audience = required(&self.audience, AUTH0_MGMT_AUDIENCE_ENV)?;

        let response = self
            .http
            .post(format!("{}{TOKEN_PATH}", base_url(domain)))
            .json(&TokenRequest {
                grant_type: "client_credentials",
                client_id,
                client_secret,
                audience,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Management token request failed");
                ManagementError::Network(format!("token request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Management token request rejected");
            return Err(ManagementError::AuthFailed(format!(
                "token request returned {status}: {body}"
            )));
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| ManagementError::InvalidResponse(format!("invalid token response: {e}")))?;

        if token_response.access_token.trim().is_empty() {
            return Err(ManagementError::InvalidResponse(
                "token response did not include access_token".to_string(),
            ));
        }

        let expires_at = chrono::TimeDelta::try_seconds(token_response.expires_in)
            .and_then(|lifetime| self.clock.now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                ManagementError::InvalidResponse(format!(
                    "token response expires_in out of range: {}",
                    token_response.expires_in
                ))
            })?;
        info!(%expires_at, "Obtained management API token");

        Ok(ManagementCredential {
            token: token_response.access_token,
            expires_at,
        })
    }
}

pub(crate) fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, ManagementError> {
    value
        .as_deref()
        .ok_or(ManagementError::MissingConfig(name))
}
