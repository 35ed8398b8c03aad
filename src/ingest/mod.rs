// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batched ingestion into the vector store

pub mod batching;
pub mod engine;
pub mod report;

pub use batching::{BatchMode, IngestRateLimiter};
pub use engine::{IngestEngine, IngestOptions};
pub use report::{FailedObject, IngestReport, FAILURE_SAMPLE_SIZE};
