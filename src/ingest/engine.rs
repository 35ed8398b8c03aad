// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch ingestion engine
//!
//! Pulls records lazily from a stream, skips ids the store already holds,
//! and submits the rest in batches. A batch with per-object failures halts
//! the run; batches already acknowledged stay committed, so a re-run picks
//! up where this one stopped.

use futures::stream::{self, Stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::batching::BatchMode;
use super::report::{FailedObject, IngestReport};
use crate::config::IngestSettings;
use crate::errors::CoreError;
use crate::records::{ConversationRecord, RawRow};
use crate::store::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    pub mode: BatchMode,
    /// Stop after this many source rows
    pub max_objects: usize,
    /// Character cap applied to `text`
    pub max_text_length: usize,
}

impl IngestOptions {
    pub fn fixed_size(settings: &IngestSettings) -> Self {
        Self {
            mode: BatchMode::FixedSize {
                batch_size: settings.batch_size,
            },
            max_objects: settings.max_objects,
            max_text_length: settings.max_text_length,
        }
    }

    pub fn rate_limited(settings: &IngestSettings) -> Self {
        Self {
            mode: BatchMode::RateLimited {
                requests_per_minute: settings.requests_per_minute,
            },
            max_objects: settings.max_objects,
            max_text_length: settings.max_text_length,
        }
    }

    pub fn with_max_objects(mut self, max_objects: usize) -> Self {
        self.max_objects = max_objects;
        self
    }
}

pub struct IngestEngine {
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl IngestEngine {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Ingest raw source rows
    ///
    /// # Errors
    /// - `CoreError::Timestamp` / `CoreError::Source` for a row that cannot
    ///   be converted; earlier batches remain committed
    /// - `CoreError::BackendUnavailable` if the store rejects a call outright
    pub async fn ingest<S>(&self, rows: S, options: IngestOptions) -> Result<IngestReport, CoreError>
    where
        S: Stream<Item = Result<RawRow, CoreError>> + Send,
    {
        let max_text_length = options.max_text_length;
        let records = rows.map(move |row| row.and_then(|r| ConversationRecord::from_raw(r, max_text_length)));
        self.ingest_records(records, options).await
    }

    /// Convenience wrapper for synchronous sources such as `JsonlSource`
    pub async fn ingest_iter<I>(&self, rows: I, options: IngestOptions) -> Result<IngestReport, CoreError>
    where
        I: IntoIterator<Item = Result<RawRow, CoreError>>,
        I::IntoIter: Send,
    {
        self.ingest(stream::iter(rows), options).await
    }

    /// Ingest already-built records, vectors included when present
    pub async fn ingest_records<S>(
        &self,
        records: S,
        options: IngestOptions,
    ) -> Result<IngestReport, CoreError>
    where
        S: Stream<Item = Result<ConversationRecord, CoreError>> + Send,
    {
        futures::pin_mut!(records);

        let batch_size = options.mode.batch_size();
        let limiter = options.mode.limiter();
        let start = Instant::now();

        let mut report = IngestReport::default();
        let mut pending: Vec<ConversationRecord> = Vec::with_capacity(batch_size);
        let mut pending_ids: HashSet<Uuid> = HashSet::new();

        info!(
            "Ingesting into {} ({:?}, batch size {}, max {} objects)",
            self.collection, options.mode, batch_size, options.max_objects
        );

        while report.processed < options.max_objects {
            let Some(item) = records.next().await else {
                break;
            };
            let record = item?;
            report.processed += 1;

            if pending_ids.contains(&record.id) || self.exists(record.id).await? {
                debug!("Skipping existing object {}", record.id);
                report.skipped += 1;
                continue;
            }

            if let Some(limiter) = &limiter {
                limiter.wait().await;
            }
            pending_ids.insert(record.id);
            pending.push(record);

            if pending.len() >= batch_size {
                self.flush(&mut pending, &mut report).await?;
                pending_ids.clear();
                if report.has_failures() {
                    break;
                }
            }
        }

        if report.processed >= options.max_objects {
            report.reached_max_objects = true;
            info!("Reached max objects ({}), stopping", options.max_objects);
        }

        if !report.has_failures() && !pending.is_empty() {
            self.flush(&mut pending, &mut report).await?;
        }

        if report.has_failures() {
            report.halted = true;
            warn!(
                "Ingestion halted: {} objects failed, first failures: {:?}",
                report.failed_count, report.failed_sample
            );
        }

        info!(
            "Ingestion finished: {} submitted, {} skipped, {} failed in {} batches ({}ms)",
            report.submitted,
            report.skipped,
            report.failed_count,
            report.batches,
            start.elapsed().as_millis()
        );
        Ok(report)
    }

    async fn exists(&self, id: Uuid) -> Result<bool, CoreError> {
        self.store
            .object_exists(&self.collection, id)
            .await
            .map_err(|e| CoreError::backend("object_exists", e))
    }

    async fn flush(
        &self,
        pending: &mut Vec<ConversationRecord>,
        report: &mut IngestReport,
    ) -> Result<(), CoreError> {
        let batch_index = report.batches;
        let batch = std::mem::take(pending);
        let size = batch.len();

        let outcome = self
            .store
            .insert_batch(&self.collection, batch)
            .await
            .map_err(|e| CoreError::backend("insert_batch", e))?;

        let (succeeded, failed) = (outcome.succeeded.len(), outcome.failed.len());
        report.batches += 1;
        report.submitted += succeeded;
        for failure in outcome.failed {
            report.record_failure(FailedObject {
                id: failure.id,
                batch_index,
                message: failure.message,
            });
        }

        debug!(
            "Batch {} flushed: {} objects, {} succeeded, {} failed",
            batch_index, size, succeeded, failed
        );
        Ok(())
    }
}
