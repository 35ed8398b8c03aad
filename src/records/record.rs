// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::source::RawRow;
use super::timestamp::parse_timestamp;
use crate::errors::CoreError;

/// Vector space name -> embedding. Ordered so iteration and export are stable.
pub type NamedVectors = BTreeMap<String, Vec<f32>>;

/// Characters shown in a result summary line
const PREVIEW_CHARS: usize = 50;

/// Stored property set of one support-chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordProperties {
    pub text: String,
    pub dialogue_id: i64,
    pub company_author: String,
    pub created_at: DateTime<Utc>,
}

impl RecordProperties {
    /// Deterministic UUIDv5 over the canonical JSON form of the properties.
    ///
    /// Identical content always maps to the same id, which is what makes
    /// re-ingestion idempotent.
    pub fn content_id(&self) -> Uuid {
        let canonical = json!({
            "company_author": self.company_author,
            "created_at": self.created_at.to_rfc3339(),
            "dialogue_id": self.dialogue_id,
            "text": self.text,
        })
        .to_string();
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, canonical.as_bytes())
    }
}

/// One support-chat turn plus its named vectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: Uuid,
    pub properties: RecordProperties,
    pub vectors: NamedVectors,
}

impl ConversationRecord {
    /// Build a record from properties, deriving the id from content
    pub fn new(properties: RecordProperties) -> Self {
        Self {
            id: properties.content_id(),
            properties,
            vectors: NamedVectors::new(),
        }
    }

    /// Validating conversion from a raw source row. Precomputed vectors on
    /// the row are carried over unchanged.
    ///
    /// # Arguments
    /// * `row` - Raw row as read from the source
    /// * `max_text_length` - Cap on the text body, in characters
    ///
    /// # Errors
    /// Returns `CoreError::Timestamp` if `created_at` cannot be parsed
    pub fn from_raw(row: RawRow, max_text_length: usize) -> Result<Self, CoreError> {
        let created_at = parse_timestamp(&row.created_at)?;
        let text = truncate_chars(&row.text, max_text_length);

        Ok(Self::new(RecordProperties {
            text,
            dialogue_id: row.dialogue_id,
            company_author: row.company_author,
            created_at,
        })
        .with_vectors(row.vectors))
    }

    pub fn with_vectors(mut self, vectors: NamedVectors) -> Self {
        self.vectors = vectors;
        self
    }

    pub fn preview(&self) -> String {
        preview(&self.properties.text)
    }
}

/// First 50 characters of a text body
pub fn preview(text: &str) -> String {
    truncate_chars(text, PREVIEW_CHARS)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(text: &str) -> RawRow {
        RawRow {
            text: text.to_string(),
            dialogue_id: 42,
            company_author: "AmazonHelp".to_string(),
            created_at: "Tue Oct 31 22:10:47 +0000 2017".to_string(),
            vectors: Default::default(),
        }
    }

    #[test]
    fn test_id_is_stable_for_identical_content() {
        let a = ConversationRecord::from_raw(raw("where is my parcel"), 8000).unwrap();
        let b = ConversationRecord::from_raw(raw("where is my parcel"), 8000).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_id_changes_with_content() {
        let a = ConversationRecord::from_raw(raw("where is my parcel"), 8000).unwrap();
        let b = ConversationRecord::from_raw(raw("where is my refund"), 8000).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_text_is_capped_on_char_boundary() {
        let record = ConversationRecord::from_raw(raw("héllo wörld"), 4).unwrap();
        assert_eq!(record.properties.text, "héll");
    }

    #[test]
    fn test_bad_timestamp_is_hard_error() {
        let mut row = raw("hi");
        row.created_at = "not a date".to_string();
        let err = ConversationRecord::from_raw(row, 8000).unwrap_err();
        assert!(matches!(err, CoreError::Timestamp { .. }));
    }

    #[test]
    fn test_preview_is_fifty_chars() {
        let text = "a".repeat(80);
        assert_eq!(preview(&text).chars().count(), 50);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_properties_json_uses_store_field_names() {
        let record = ConversationRecord::from_raw(raw("hi"), 8000).unwrap();
        let value = serde_json::to_value(&record.properties).unwrap();
        assert_eq!(value["company_author"], "AmazonHelp");
        assert_eq!(value["dialogue_id"], 42);
        assert_eq!(value["created_at"], "2017-10-31T22:10:47Z");
    }
}
