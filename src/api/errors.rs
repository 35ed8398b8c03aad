// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

/// HTTP-facing wrapper around `CoreError`
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoreError::Validation { .. } => StatusCode::BAD_REQUEST,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::DestinationExists(_) => StatusCode::CONFLICT,
            CoreError::BackendUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        let details = match &self.0 {
            CoreError::Validation { field, .. } => Some(HashMap::from([(
                "field".to_string(),
                serde_json::Value::String(field.to_string()),
            )])),
            CoreError::BackendUnavailable { operation, source } => Some(HashMap::from([
                (
                    "operation".to_string(),
                    serde_json::Value::String(operation.to_string()),
                ),
                (
                    "retryable".to_string(),
                    serde_json::Value::Bool(source.is_transient()),
                ),
            ])),
            _ => None,
        };

        ErrorResponse {
            error_type: self.0.error_code().to_lowercase(),
            message: self.0.to_string(),
            details,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status_code().is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (self.status_code(), Json(self.to_response())).into_response()
    }
}
