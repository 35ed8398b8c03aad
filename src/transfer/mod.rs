// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bulk export and import of the full corpus
//!
//! `export` writes every record with all of its named vectors to a container
//! file; `import` feeds such a file back through fixed-size batched
//! ingestion with the stored vectors, so nothing is re-embedded.

pub mod container;

use futures::stream;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::ingest::{BatchMode, IngestEngine, IngestOptions, IngestReport};
use crate::store::VectorStore;

pub use container::{ContainerEntry, ContainerError, ContainerReader, ContainerWriter};

/// Objects fetched per store page during export
pub const EXPORT_PAGE_SIZE: usize = 100;

/// Decoded records buffered ahead of ingestion during import
const IMPORT_QUEUE_DEPTH: usize = 256;

pub struct BulkTransfer {
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl BulkTransfer {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Export up to `max_objects` records to `destination`.
    ///
    /// The file is assembled under a temporary name in the destination's
    /// directory and only moved into place once complete.
    ///
    /// # Errors
    /// `CoreError::DestinationExists` if `destination` is already present
    pub async fn export(&self, destination: &Path, max_objects: usize) -> Result<usize, CoreError> {
        if destination.exists() {
            return Err(CoreError::DestinationExists(destination.display().to_string()));
        }
        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let start = Instant::now();
        let temp = NamedTempFile::new_in(parent)?;
        let mut writer = ContainerWriter::new(BufWriter::new(temp))?;
        let mut cursor: Option<Uuid> = None;

        while writer.entries() < max_objects {
            let page_size = EXPORT_PAGE_SIZE.min(max_objects - writer.entries());
            let page = self
                .store
                .iterate(&self.collection, cursor, page_size)
                .await
                .map_err(|e| CoreError::backend("export", e))?;
            let Some(last) = page.last() else {
                break;
            };
            cursor = Some(last.id);

            for record in &page {
                writer.append(&ContainerEntry::from_record(record)?)?;
            }
            debug!("Exported {} objects so far", writer.entries());
        }

        let count = writer.entries();
        let temp = writer
            .finish()?
            .into_inner()
            .map_err(|e| CoreError::Io(e.into_error()))?;
        temp.persist_noclobber(destination).map_err(|e| {
            if e.error.kind() == std::io::ErrorKind::AlreadyExists {
                CoreError::DestinationExists(destination.display().to_string())
            } else {
                CoreError::Io(e.error)
            }
        })?;

        info!(
            "Exported {} objects from {} to {} in {}ms",
            count,
            self.collection,
            destination.display(),
            start.elapsed().as_millis()
        );
        Ok(count)
    }

    /// Import a container through fixed-size batched ingestion
    ///
    /// The file is decoded on a blocking thread and handed over through a
    /// bounded channel, so the runtime never waits on disk reads.
    pub async fn import(&self, source: &Path, batch_size: usize) -> Result<IngestReport, CoreError> {
        let path = source.to_path_buf();
        let reader = task::spawn_blocking(move || -> Result<_, CoreError> {
            Ok(ContainerReader::new(BufReader::new(File::open(&path)?))?)
        })
        .await
        .map_err(|e| CoreError::Io(std::io::Error::other(e)))??;
        info!("Importing {} into {}", source.display(), self.collection);

        let (tx, rx) = mpsc::channel(IMPORT_QUEUE_DEPTH);
        let decoder = task::spawn_blocking(move || {
            for entry in reader {
                let item = entry
                    .and_then(ContainerEntry::into_record)
                    .map_err(CoreError::from);
                let failed = item.is_err();
                // receiver gone means ingestion already stopped
                if tx.blocking_send(item).is_err() || failed {
                    break;
                }
            }
        });

        let records = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        let options = IngestOptions {
            mode: BatchMode::FixedSize { batch_size },
            max_objects: usize::MAX,
            max_text_length: usize::MAX,
        };
        let result = IngestEngine::new(self.store.clone(), self.collection.clone())
            .ingest_records(records, options)
            .await;

        if let Err(e) = decoder.await {
            warn!("Container decoder ended abnormally: {}", e);
        }
        result
    }
}
