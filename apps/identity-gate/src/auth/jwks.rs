// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Behaviour
//!
//! - Keys are cached by key id for the TTL the endpoint advertises through
//!   `Cache-Control: max-age`, or a configured default when it does not.
//! - Expired keys are never served. If the refresh fails the lookup fails
//!   with [`AuthError::KeyUnavailable`], not with an invalid-token error.
//! - A miss triggers one refresh. Refreshes are serialized, and callers that
//!   queued behind an in-flight refresh reuse its result instead of fetching
//!   again.
//! - Fetches are capped per rolling minute. Once the cap is reached further
//!   misses fail immediately.
//! - [`KeyResolver::warm`] (used by health checks) joins the same
//!   single-flight and never spends the last fetch of the window.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse};
use jsonwebtoken::{Algorithm, DecodingKey};
use reqwest::header::CACHE_CONTROL;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use super::error::{AuthError, KeyFetchError};
use crate::clock::{span, Clock};
use crate::config::{DEFAULT_JWKS_CACHE_TTL, DEFAULT_JWKS_REQUESTS_PER_MINUTE};

/// Keys from one successful fetch.
struct KeySet {
    keys: HashMap<String, Arc<DecodingKey>>,
    expires_at: DateTime<Utc>,
}

impl KeySet {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Timestamps of fetches inside the rate-limit window.
#[derive(Default)]
struct FetchWindow {
    recent: VecDeque<DateTime<Utc>>,
}

impl FetchWindow {
    /// Fetches still allowed in the minute ending at `now`.
    fn remaining(&mut self, now: DateTime<Utc>, limit: u32) -> usize {
        let window_start = now - chrono::Duration::minutes(1);
        while self.recent.front().is_some_and(|t| *t <= window_start) {
            self.recent.pop_front();
        }
        (limit as usize).saturating_sub(self.recent.len())
    }
}

/// Resolves token key ids to verification keys from the provider's JWKS.
pub struct KeyResolver {
    jwks_url: String,
    algorithm: Algorithm,
    default_ttl: Duration,
    requests_per_minute: u32,
    clock: Arc<dyn Clock>,
    client: reqwest::Client,
    cache: RwLock<Option<KeySet>>,
    /// Held for the duration of a fetch; doubles as the rate-limit window.
    refresh: Mutex<FetchWindow>,
    /// Bumped every time a fetched set is stored.
    generation: AtomicU64,
}

impl KeyResolver {
    /// Create a resolver for `jwks_url` accepting keys usable with `algorithm`.
    pub fn new(
        client: reqwest::Client,
        jwks_url: impl Into<String>,
        algorithm: Algorithm,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            algorithm,
            default_ttl: DEFAULT_JWKS_CACHE_TTL,
            requests_per_minute: DEFAULT_JWKS_REQUESTS_PER_MINUTE,
            clock,
            client,
            cache: RwLock::new(None),
            refresh: Mutex::new(FetchWindow::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// TTL used when the endpoint does not send `max-age`.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Cap on fetches per rolling minute (at least one).
    pub fn with_requests_per_minute(mut self, limit: u32) -> Self {
        self.requests_per_minute = limit.max(1);
        self
    }

    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Get the verification key for `kid`.
    ///
    /// Serves a fresh cached key when present; otherwise refreshes the key
    /// set at most once for this call and looks again.
    pub async fn resolve_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        let seen = {
            let cache = self.cache.read().await;
            if let Some(set) = cache.as_ref().filter(|s| s.is_fresh(self.clock.now())) {
                if let Some(key) = set.keys.get(kid) {
                    return Ok(Arc::clone(key));
                }
            }
            self.generation.load(Ordering::Acquire)
        };

        let mut window = self.refresh.lock().await;

        if self.generation.load(Ordering::Acquire) != seen {
            let cache = self.cache.read().await;
            if let Some(set) = cache.as_ref().filter(|s| s.is_fresh(self.clock.now())) {
                debug!(kid, "Key set refreshed by a concurrent caller");
                return set.keys.get(kid).cloned().ok_or(AuthError::KeyNotFound);
            }
        }

        let set = self
            .fetch_limited(&mut window)
            .await
            .map_err(AuthError::KeyUnavailable)?;
        let key = set.keys.get(kid).cloned();
        self.store(set).await;

        key.ok_or_else(|| {
            debug!(kid, "Key id not present in refreshed key set");
            AuthError::KeyNotFound
        })
    }

    /// Fetch the key set unless a fresh one is already cached.
    ///
    /// Shares the refresh lock with [`resolve_key`](Self::resolve_key) and
    /// never takes the last fetch left in the rate-limit window.
    pub async fn warm(&self) -> Result<(), AuthError> {
        if self.is_cached().await {
            return Ok(());
        }

        let mut window = self.refresh.lock().await;
        if self.is_cached().await {
            return Ok(());
        }
        if window.remaining(self.clock.now(), self.requests_per_minute) <= 1 {
            debug!(jwks_url = %self.jwks_url, "Skipping JWKS warm-up, fetch budget reserved");
            return Err(AuthError::KeyUnavailable(KeyFetchError::RateLimited));
        }

        let set = self
            .fetch_limited(&mut window)
            .await
            .map_err(AuthError::KeyUnavailable)?;
        self.store(set).await;
        Ok(())
    }

    /// Check if keys are currently cached and within their TTL.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .as_ref()
            .is_some_and(|set| set.is_fresh(self.clock.now()))
    }

    async fn store(&self, set: KeySet) {
        let mut cache = self.cache.write().await;
        *cache = Some(set);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    async fn fetch_limited(&self, window: &mut FetchWindow) -> Result<KeySet, KeyFetchError> {
        let now = self.clock.now();
        if window.remaining(now, self.requests_per_minute) == 0 {
            warn!(
                jwks_url = %self.jwks_url,
                limit = self.requests_per_minute,
                "JWKS fetch rate limit reached"
            );
            return Err(KeyFetchError::RateLimited);
        }
        window.recent.push_back(now);

        self.fetch().await
    }

    /// Fetch the key set from the endpoint.
    async fn fetch(&self) -> Result<KeySet, KeyFetchError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| KeyFetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KeyFetchError::Status(response.status().as_u16()));
        }

        let ttl = response
            .headers()
            .get(CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(self.default_ttl);

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeyFetchError::InvalidResponse(e.to_string()))?;

        let keys: HashMap<String, Arc<DecodingKey>> = jwks
            .keys
            .iter()
            .filter_map(|jwk| {
                let kid = jwk.common.key_id.clone()?;
                let key = jwk_to_decoding_key(jwk, self.algorithm)?;
                Some((kid, Arc::new(key)))
            })
            .collect();

        debug!(
            jwks_url = %self.jwks_url,
            published = jwks.keys.len(),
            usable = keys.len(),
            ttl_secs = ttl.as_secs(),
            "Fetched JWKS"
        );

        Ok(KeySet {
            keys,
            expires_at: self.clock.now() + span(ttl),
        })
    }
}

/// Extract `max-age` from a `Cache-Control` header value.
fn parse_max_age(header: &str) -> Option<Duration> {
    header
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Convert a JWK into a decoding key usable with `algorithm`.
///
/// Encryption keys, keys of another family and keys declaring a different
/// algorithm are skipped.
fn jwk_to_decoding_key(jwk: &Jwk, algorithm: Algorithm) -> Option<DecodingKey> {
    if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
        return None;
    }
    if let Some(declared) = jwk.common.key_algorithm {
        if key_algorithm(declared) != Some(algorithm) {
            return None;
        }
    }

    match (&jwk.algorithm, algorithm) {
        (
            AlgorithmParameters::RSA(rsa),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512,
        ) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e).ok(),
        (AlgorithmParameters::EllipticCurve(ec), Algorithm::ES256 | Algorithm::ES384) => {
            DecodingKey::from_ec_components(&ec.x, &ec.y).ok()
        }
        (AlgorithmParameters::OctetKeyPair(okp), Algorithm::EdDSA) => {
            DecodingKey::from_ed_components(&okp.x).ok()
        }
        _ => None,
    }
}

fn key_algorithm(declared: KeyAlgorithm) -> Option<Algorithm> {
    match declared {
        KeyAlgorithm::RS256 => Some(Algorithm::RS256),
        KeyAlgorithm::RS384 => Some(Algorithm::RS384),
        KeyAlgorithm::RS512 => Some(Algorithm::RS512),
        KeyAlgorithm::PS256 => Some(Algorithm::PS256),
        KeyAlgorithm::PS384 => Some(Algorithm::PS384),
        KeyAlgorithm::PS512 => Some(Algorithm::PS512),
        KeyAlgorithm::ES256 => Some(Algorithm::ES256),
        KeyAlgorithm::ES384 => Some(Algorithm::ES384),
        KeyAlgorithm::EdDSA => Some(Algorithm::EdDSA),
        _ => None,
    }
}
