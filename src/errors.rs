// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error taxonomy for the query, ingestion and transfer pipelines
//!
//! Every variant carries the operation it came from plus enough context
//! (id, batch index, underlying cause) to retry safely:
//! - Validation errors (bad limit, malformed filter pattern)
//! - Backend errors (store connection or query failure)
//! - Partial ingestion failures (prior batches stay committed)
//! - Export destination conflicts

use thiserror::Error;

use crate::ingest::FailedObject;
use crate::store::StoreError;
use crate::transfer::ContainerError;

/// Errors surfaced by the core pipelines
#[derive(Error, Debug)]
pub enum CoreError {
    /// Caller contract violation, rejected before any side effect
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Id absent on lookup
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Store connection or query failure
    #[error("Backend unavailable during {operation}: {source}")]
    BackendUnavailable {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// Generation failed; callers downgrade this to an empty generation
    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    /// A batch reported per-object failures and the run halted
    #[error("Ingestion halted at batch {batch_index}: {failed_count} objects failed")]
    PartialIngestionFailure {
        batch_index: usize,
        failed_count: usize,
        sample: Vec<FailedObject>,
    },

    /// Export target already present on disk
    #[error("Destination already exists: {0}. Please remove it first.")]
    DestinationExists(String),

    /// Raw timestamp could not be parsed into an instant
    #[error("Unparseable timestamp {raw:?}: {reason}")]
    Timestamp { raw: String, reason: String },

    /// Container file could not be read or written
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    /// Source rows could not be read
    #[error("Source error at line {line}: {reason}")]
    Source { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        CoreError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn backend(operation: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(id) => CoreError::NotFound(id),
            source => CoreError::BackendUnavailable { operation, source },
        }
    }

    /// Get error code for logging and metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::Validation { .. } => "VALIDATION_ERROR",
            CoreError::NotFound(_) => "NOT_FOUND",
            CoreError::BackendUnavailable { .. } => "BACKEND_UNAVAILABLE",
            CoreError::GenerationFailure(_) => "GENERATION_FAILURE",
            CoreError::PartialIngestionFailure { .. } => "PARTIAL_INGESTION_FAILURE",
            CoreError::DestinationExists(_) => "DESTINATION_EXISTS",
            CoreError::Timestamp { .. } => "TIMESTAMP_PARSE_ERROR",
            CoreError::Container(_) => "CONTAINER_ERROR",
            CoreError::Source { .. } => "SOURCE_ERROR",
            CoreError::Io(_) => "IO_ERROR",
        }
    }

    /// Check if re-running the operation can succeed without caller changes
    pub fn is_retryable(&self) -> bool {
        match self {
            CoreError::BackendUnavailable { source, .. } => source.is_transient(),
            CoreError::GenerationFailure(_) | CoreError::PartialIngestionFailure { .. } => true,
            _ => false,
        }
    }
}
