// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Search service
//!
//! Runs retrieval against the store and, when asked, one grouped generation
//! over the hits. Generation is bounded by a timeout and never costs the
//! caller the ranked results.

use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::builder::build_request;
use super::types::{QuerySpec, ResultItem, ResultSet};
use crate::config::QuerySettings;
use crate::errors::CoreError;
use crate::store::{HybridQuery, QueryResponse, VectorStore};

pub struct SearchService {
    store: Arc<dyn VectorStore>,
    collection: String,
    settings: QuerySettings,
}

impl SearchService {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, settings: QuerySettings) -> Self {
        Self {
            store,
            collection: collection.into(),
            settings,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.settings.default_limit
    }

    /// Run one search
    ///
    /// # Errors
    /// - `CoreError::Validation` for a bad limit or filter pattern
    /// - `CoreError::BackendUnavailable` if retrieval itself fails
    pub async fn search(&self, spec: &QuerySpec) -> Result<ResultSet, CoreError> {
        let request = build_request(spec, &self.settings.target_vector)?;
        let start = Instant::now();

        let response = if request.grouped_task.is_some() {
            self.search_with_generation(&request).await?
        } else {
            self.retrieve(&request).await?
        };

        info!(
            "Search complete: {} results ({} mode) in {}ms",
            response.objects.len(),
            spec.mode,
            start.elapsed().as_millis()
        );

        Ok(ResultSet {
            query: spec.query.clone(),
            mode: spec.mode,
            items: response.objects.into_iter().map(ResultItem::from).collect(),
            generated: response.generated,
        })
    }

    async fn retrieve(&self, request: &HybridQuery) -> Result<QueryResponse, CoreError> {
        self.store
            .hybrid_query(&self.collection, request)
            .await
            .map_err(|e| CoreError::backend("search", e))
    }

    /// Retrieval plus grouped generation, falling back to plain retrieval
    async fn search_with_generation(&self, request: &HybridQuery) -> Result<QueryResponse, CoreError> {
        let limit = self.settings.generation_timeout;

        match timeout(limit, self.store.hybrid_query(&self.collection, request)).await {
            Ok(Ok(mut response)) => {
                if let Some(error) = response.generation_error.take() {
                    warn!("Generation failed, returning results only: {}", error);
                    response.generated = None;
                }
                Ok(response)
            }
            Ok(Err(e)) => {
                warn!("Search with generation failed ({}), retrying without", e);
                self.retrieve(&without_generation(request)).await
            }
            Err(_) => {
                warn!(
                    "Generation timed out after {}ms, retrying without",
                    limit.as_millis()
                );
                debug!("Dropped grouped task: {:?}", request.grouped_task);
                self.retrieve(&without_generation(request)).await
            }
        }
    }
}

fn without_generation(request: &HybridQuery) -> HybridQuery {
    HybridQuery {
        grouped_task: None,
        ..request.clone()
    }
}
