// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod aggregation;
pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod generation;
pub mod ingest;
pub mod monitoring;
pub mod query;
pub mod records;
pub mod store;
pub mod transfer;

// Re-export main types
pub use aggregation::{cluster_stats, top_companies, ClusterStats, CompanyCount, TopCompaniesOptions};
pub use app::App;
pub use config::AppConfig;
pub use errors::CoreError;
pub use ingest::{BatchMode, IngestEngine, IngestOptions, IngestReport};
pub use monitoring::{MetricSample, MetricSource, MetricsPoller};
pub use query::{QuerySpec, ResultItem, ResultSet, SearchMode, SearchService};
pub use records::{ConversationRecord, JsonlSource, RawRow};
pub use store::{InMemoryStore, StoreError, VectorStore, WeaviateStore};
pub use transfer::BulkTransfer;
