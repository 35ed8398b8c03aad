// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};

use super::mode::SearchMode;
use crate::errors::CoreError;
use crate::records::ConversationRecord;
use crate::store::ScoredObject;

/// Smallest accepted result limit
pub const MIN_LIMIT: usize = 1;
/// Largest accepted result limit
pub const MAX_LIMIT: usize = 20;

/// One search action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub query: String,
    /// Wildcard pattern on company author; empty means no filter
    #[serde(default)]
    pub company_filter: String,
    pub limit: usize,
    #[serde(default)]
    pub mode: SearchMode,
    /// Instruction for one grounded answer over the results
    #[serde(default)]
    pub generation_instruction: Option<String>,
}

impl QuerySpec {
    pub fn new(query: impl Into<String>, limit: usize, mode: SearchMode) -> Self {
        Self {
            query: query.into(),
            company_filter: String::new(),
            limit,
            mode,
            generation_instruction: None,
        }
    }

    pub fn with_company_filter(mut self, pattern: impl Into<String>) -> Self {
        self.company_filter = pattern.into();
        self
    }

    pub fn with_generation(mut self, instruction: impl Into<String>) -> Self {
        self.generation_instruction = Some(instruction.into());
        self
    }

    /// Instruction, if one was given and is not blank
    pub fn instruction(&self) -> Option<&str> {
        self.generation_instruction
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Reject out-of-range limits
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(MIN_LIMIT..=MAX_LIMIT).contains(&self.limit) {
            return Err(CoreError::validation(
                "limit",
                format!(
                    "{} is outside [{}, {}]",
                    self.limit, MIN_LIMIT, MAX_LIMIT
                ),
            ));
        }
        Ok(())
    }
}

/// One ranked hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    pub record: ConversationRecord,
    pub score: f32,
    /// First 50 characters of the text
    pub preview: String,
}

impl From<ScoredObject> for ResultItem {
    fn from(hit: ScoredObject) -> Self {
        Self {
            preview: hit.record.preview(),
            record: hit.record,
            score: hit.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub query: String,
    pub mode: SearchMode,
    pub items: Vec<ResultItem>,
    /// Grounded answer; `None` when not requested or when generation failed
    pub generated: Option<String>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
