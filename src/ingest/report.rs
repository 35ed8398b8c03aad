// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// Failed objects kept for diagnostics
pub const FAILURE_SAMPLE_SIZE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedObject {
    pub id: Uuid,
    pub batch_index: usize,
    pub message: String,
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Rows pulled from the source
    pub processed: usize,
    /// Objects the store acknowledged
    pub submitted: usize,
    /// Rows already present (or repeated within the run)
    pub skipped: usize,
    pub failed_count: usize,
    /// First few failures
    pub failed_sample: Vec<FailedObject>,
    pub batches: usize,
    /// Stopped because a batch reported failures
    pub halted: bool,
    /// Stopped because the object cap was reached
    pub reached_max_objects: bool,
}

impl IngestReport {
    pub(crate) fn record_failure(&mut self, failure: FailedObject) {
        self.failed_count += 1;
        if self.failed_sample.len() < FAILURE_SAMPLE_SIZE {
            self.failed_sample.push(failure);
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed_count > 0
    }

    /// Promote a halted run to `CoreError::PartialIngestionFailure`
    pub fn into_result(self) -> Result<Self, CoreError> {
        if self.halted {
            let batch_index = self
                .failed_sample
                .first()
                .map(|f| f.batch_index)
                .unwrap_or_else(|| self.batches.saturating_sub(1));
            return Err(CoreError::PartialIngestionFailure {
                batch_index,
                failed_count: self.failed_count,
                sample: self.failed_sample,
            });
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(batch_index: usize) -> FailedObject {
        FailedObject {
            id: Uuid::new_v4(),
            batch_index,
            message: "bad vector".to_string(),
        }
    }

    #[test]
    fn test_sample_is_bounded() {
        let mut report = IngestReport::default();
        for _ in 0..5 {
            report.record_failure(failure(2));
        }
        assert_eq!(report.failed_count, 5);
        assert_eq!(report.failed_sample.len(), FAILURE_SAMPLE_SIZE);
    }

    #[test]
    fn test_into_result() {
        let clean = IngestReport {
            submitted: 4,
            ..Default::default()
        };
        assert!(clean.into_result().is_ok());

        let mut halted = IngestReport::default();
        halted.record_failure(failure(1));
        halted.halted = true;
        match halted.into_result() {
            Err(CoreError::PartialIngestionFailure {
                batch_index,
                failed_count,
                sample,
            }) => {
                assert_eq!(batch_index, 1);
                assert_eq!(failed_count, 1);
                assert_eq!(sample.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
