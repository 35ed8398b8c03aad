// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Read-only dashboard endpoints

use axum::{
    extract::{Json, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::errors::ApiError;
use crate::aggregation::{cluster_stats, top_companies, ClusterStats, CompanyCount, TopCompaniesOptions};
use crate::ingest::IngestReport;
use crate::monitoring::{MetricSample, MetricsPoller};
use crate::query::{QuerySpec, ResultSet, SearchMode, SearchService};
use crate::store::VectorStore;

/// Shared handler state
#[derive(Clone)]
pub struct DashboardState {
    store: Arc<dyn VectorStore>,
    collection: String,
    search: Arc<SearchService>,
    memory: Option<Arc<MetricsPoller>>,
    last_results: Arc<RwLock<Option<ResultSet>>>,
    last_ingest: Arc<RwLock<Option<IngestReport>>>,
}

impl DashboardState {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>, search: Arc<SearchService>) -> Self {
        Self {
            store,
            collection: collection.into(),
            search,
            memory: None,
            last_results: Arc::new(RwLock::new(None)),
            last_ingest: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_memory_poller(mut self, poller: Arc<MetricsPoller>) -> Self {
        self.memory = Some(poller);
        self
    }

    /// Publish the report of the most recent ingestion run
    pub async fn set_ingest_report(&self, report: IngestReport) {
        *self.last_ingest.write().await = Some(report);
    }
}

pub fn router(state: DashboardState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/top-companies", get(top_companies_handler))
        .route("/api/search", post(search_handler))
        .route("/api/search/last", get(last_search_handler))
        .route("/api/cluster", get(cluster_handler))
        .route("/api/metrics/memory", get(memory_handler))
        .route("/api/ingest/report", get(ingest_report_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve until `shutdown` is cancelled
pub async fn start_server(
    state: DashboardState,
    bind_address: &str,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Dashboard listening on {}", addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

pub(crate) async fn health_handler(State(state): State<DashboardState>) -> impl IntoResponse {
    let ready = state.store.is_ready().await.unwrap_or(false);
    Json(json!({
        "status": if ready { "ok" } else { "degraded" },
        "store_ready": ready,
        "collection": state.collection,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct TopCompaniesParams {
    pub limit: Option<usize>,
    pub min_occurrences: Option<u64>,
}

pub(crate) async fn top_companies_handler(
    State(state): State<DashboardState>,
    Query(params): Query<TopCompaniesParams>,
) -> Result<Json<Vec<CompanyCount>>, ApiError> {
    let mut options = TopCompaniesOptions::default();
    if let Some(limit) = params.limit {
        options.limit = limit;
    }
    options.min_occurrences = params.min_occurrences;

    let top = top_companies(state.store.as_ref(), &state.collection, options).await?;
    Ok(Json(top))
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub company_filter: String,
    pub limit: Option<usize>,
    #[serde(default)]
    pub mode: SearchMode,
    pub generation_instruction: Option<String>,
}

pub(crate) async fn search_handler(
    State(state): State<DashboardState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<ResultSet>, ApiError> {
    let spec = QuerySpec {
        query: request.query,
        company_filter: request.company_filter,
        limit: request.limit.unwrap_or_else(|| state.search.default_limit()),
        mode: request.mode,
        generation_instruction: request.generation_instruction,
    };

    let results = state.search.search(&spec).await?;
    *state.last_results.write().await = Some(results.clone());
    Ok(Json(results))
}

pub(crate) async fn last_search_handler(State(state): State<DashboardState>) -> Json<Option<ResultSet>> {
    Json(state.last_results.read().await.clone())
}

pub(crate) async fn cluster_handler(
    State(state): State<DashboardState>,
) -> Result<Json<ClusterStats>, ApiError> {
    Ok(Json(cluster_stats(state.store.as_ref(), &state.collection).await?))
}

#[derive(Debug, Clone, Serialize)]
pub struct MemorySeries {
    pub source: Option<&'static str>,
    pub samples: Vec<MetricSample>,
}

pub(crate) async fn memory_handler(State(state): State<DashboardState>) -> Json<MemorySeries> {
    let series = match &state.memory {
        Some(poller) => MemorySeries {
            source: Some(poller.source_name()),
            samples: poller.snapshot().await,
        },
        None => MemorySeries {
            source: None,
            samples: Vec::new(),
        },
    };
    Json(series)
}

pub(crate) async fn ingest_report_handler(
    State(state): State<DashboardState>,
) -> Json<Option<IngestReport>> {
    Json(state.last_ingest.read().await.clone())
}
