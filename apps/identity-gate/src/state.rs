// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{OperationPolicy, TokenVerifier};
use crate::clock::{Clock, SystemClock};
use crate::config::{AuthSettings, ManagementSettings};
use crate::providers::{ManagementClient, ManagementTokenCache, ProvisioningWorkflow};

/// Timeout applied to every outbound provider call.
const OUTBOUND_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide services shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<TokenVerifier>,
    pub policy: Arc<OperationPolicy>,
    pub roles_claim: Option<String>,
    pub provisioning: Arc<ProvisioningWorkflow>,
    /// First management setting that is not configured, if any.
    pub management_missing: Option<&'static str>,
}

impl AppState {
    /// Build the state with a shared HTTP client and the system clock.
    pub fn from_settings(
        auth: &AuthSettings,
        management: &ManagementSettings,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(OUTBOUND_TIMEOUT)
            .build()?;
        Ok(Self::new(auth, management, http, Arc::new(SystemClock)))
    }

    pub fn new(
        auth: &AuthSettings,
        management: &ManagementSettings,
        http: reqwest::Client,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let verifier = TokenVerifier::new(auth, http.clone(), Arc::clone(&clock));
        let tokens = Arc::new(ManagementTokenCache::new(management, http.clone(), clock));
        let client = Arc::new(ManagementClient::new(management, tokens, http));

        Self {
            verifier: Arc::new(verifier),
            policy: Arc::new(OperationPolicy::service_default()),
            roles_claim: auth.roles_claim.clone(),
            provisioning: Arc::new(ProvisioningWorkflow::new(client)),
            management_missing: management.first_missing(),
        }
    }

    pub fn with_policy(mut self, policy: OperationPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }
}
