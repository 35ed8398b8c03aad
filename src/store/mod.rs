// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vector store boundary
//!
//! `VectorStore` is everything the core consumes from the backing database:
//! collection lifecycle, existence checks, batched writes with per-object
//! results, hybrid retrieval with optional grouped generation, aggregation,
//! cluster listing and cursor iteration.
//!
//! Two backends implement it:
//! - `WeaviateStore`: REST + GraphQL client
//! - `InMemoryStore`: process-local store for tests and offline runs

pub mod errors;
pub mod filter;
pub mod memory;
pub mod types;
pub mod weaviate;

use async_trait::async_trait;
use uuid::Uuid;

use crate::records::ConversationRecord;

pub use errors::StoreError;
pub use filter::{PatternError, WildcardPattern};
pub use memory::InMemoryStore;
pub use types::{
    BatchOutcome, CollectionConfig, DataType, Filter, HybridQuery, ModuleConfig,
    NamedVectorConfig, NodeInfo, ObjectFailure, PropertySchema, ProviderPreset, QueryResponse,
    ScoredObject, TenantInfo, TopOccurrence, Tokenization,
};
pub use weaviate::WeaviateStore;

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Whether the backend accepts requests
    async fn is_ready(&self) -> Result<bool, StoreError>;

    async fn collection_exists(&self, collection: &str) -> Result<bool, StoreError>;

    async fn create_collection(&self, config: &CollectionConfig) -> Result<(), StoreError>;

    /// Delete a collection; deleting a missing collection is not an error
    async fn delete_collection(&self, collection: &str) -> Result<(), StoreError>;

    async fn multi_tenancy_enabled(&self, collection: &str) -> Result<bool, StoreError>;

    async fn object_exists(&self, collection: &str, id: Uuid) -> Result<bool, StoreError>;

    /// Write a batch; individual objects may fail without failing the call
    async fn insert_batch(
        &self,
        collection: &str,
        objects: Vec<ConversationRecord>,
    ) -> Result<BatchOutcome, StoreError>;

    async fn hybrid_query(
        &self,
        collection: &str,
        query: &HybridQuery,
    ) -> Result<QueryResponse, StoreError>;

    /// Most frequent values of a text property, by descending count
    async fn top_occurrences(
        &self,
        collection: &str,
        property: &str,
        limit: usize,
        min_occurrences: Option<u64>,
    ) -> Result<Vec<TopOccurrence>, StoreError>;

    async fn total_count(&self, collection: &str) -> Result<u64, StoreError>;

    async fn nodes(&self) -> Result<Vec<NodeInfo>, StoreError>;

    async fn tenants(&self, collection: &str) -> Result<Vec<TenantInfo>, StoreError>;

    /// Page of objects (with all vectors) whose id sorts after `after`
    async fn iterate(
        &self,
        collection: &str,
        after: Option<Uuid>,
        page_size: usize,
    ) -> Result<Vec<ConversationRecord>, StoreError>;

    /// Release connections; the default does nothing
    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
