// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Raw source rows
//!
//! The support dataset is consumed as JSON Lines, one conversation turn per
//! line, read lazily so arbitrarily large dumps stream through ingestion.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use super::record::NamedVectors;
use crate::errors::CoreError;

/// A row as it arrives from the source, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub text: String,
    pub dialogue_id: i64,
    pub company_author: String,
    /// Unparsed timestamp in any of the supported layouts
    #[serde(alias = "raw_timestamp")]
    pub created_at: String,
    /// Precomputed embeddings, if the dump carries them
    #[serde(default, skip_serializing_if = "NamedVectors::is_empty")]
    pub vectors: NamedVectors,
}

impl RawRow {
    pub fn new(
        text: impl Into<String>,
        dialogue_id: i64,
        company_author: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            dialogue_id,
            company_author: company_author.into(),
            created_at: created_at.into(),
            vectors: NamedVectors::new(),
        }
    }
}

/// Lazy JSON Lines reader yielding one `RawRow` per non-blank line
pub struct JsonlSource<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl JsonlSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for JsonlSource<R> {
    type Item = Result<RawRow, CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(CoreError::Io(e))),
            };
            if line.trim().is_empty() {
                continue;
            }

            return Some(serde_json::from_str(&line).map_err(|e| CoreError::Source {
                line: self.line_no,
                reason: e.to_string(),
            }));
        }
    }
}
