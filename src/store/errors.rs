// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Errors at the vector store boundary
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ReqwestError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    #[error("Collection already exists: {0}")]
    CollectionExists(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },
    #[error("Query error: {0}")]
    Query(String),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Store not ready at {0}")]
    NotReady(String),
    #[error("Timeout")]
    Timeout,
}

impl StoreError {
    /// Connection-level failures worth retrying as-is
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(e) => e.is_timeout() || e.is_connect(),
            StoreError::Backend { status, .. } => *status >= 500 || *status == 429,
            StoreError::Timeout | StoreError::NotReady(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Timeout.is_transient());
        assert!(StoreError::Backend {
            status: 503,
            message: "busy".to_string()
        }
        .is_transient());
        assert!(StoreError::Backend {
            status: 429,
            message: "slow down".to_string()
        }
        .is_transient());
        assert!(!StoreError::Backend {
            status: 422,
            message: "bad".to_string()
        }
        .is_transient());
        assert!(!StoreError::NotFound("x".to_string()).is_transient());
    }
}
