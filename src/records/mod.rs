// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Support-conversation record model
//!
//! Raw source rows are converted into typed `ConversationRecord`s at the
//! ingestion boundary; nothing untyped travels further into the pipeline.

pub mod record;
pub mod source;
pub mod timestamp;

pub use record::{ConversationRecord, NamedVectors, RecordProperties, preview};
pub use source::{JsonlSource, RawRow};
pub use timestamp::parse_timestamp;

/// Named vector space computed from the text only
pub const TEXT_VECTOR: &str = "text";

/// Named vector space computed from text plus company author
pub const TEXT_WITH_METADATA_VECTOR: &str = "text_with_metadata";
