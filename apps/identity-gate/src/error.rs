// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::providers::{ManagementError, ProvisioningError, ProvisioningStep};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_code: &'static str,
    pub message: String,
    pub details: Map<String, Value>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
    #[serde(flatten)]
    details: Map<String, Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::new(rejection.status(), "invalid_request", rejection.body_text())
    }
}

fn management_status(err: &ManagementError) -> StatusCode {
    match err {
        ManagementError::Conflict(_) => StatusCode::CONFLICT,
        ManagementError::MissingConfig(_) | ManagementError::InvalidConfig(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<ProvisioningError> for ApiError {
    fn from(err: ProvisioningError) -> Self {
        let message = err.to_string();
        match err {
            ProvisioningError::AccountCreation(source) => {
                ApiError::new(management_status(&source), source.error_code(), message)
                    .with_detail("failed_step", ProvisioningStep::CreateAccount.as_str())
            }
            ProvisioningError::PartiallyProvisioned {
                account,
                step,
                source,
            } => ApiError::new(StatusCode::BAD_GATEWAY, "partially_provisioned", message)
                .with_detail("account_id", account.id)
                .with_detail("failed_step", step.as_str())
                .with_detail("cause", source.error_code()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}
