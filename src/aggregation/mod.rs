// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Corpus statistics for the dashboard

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::CoreError;
use crate::query::COMPANY_FIELD;
use crate::store::{NodeInfo, StoreError, VectorStore};

/// Default number of companies reported
pub const DEFAULT_TOP_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyCount {
    pub company: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopCompaniesOptions {
    pub limit: usize,
    pub min_occurrences: Option<u64>,
}

impl Default for TopCompaniesOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_TOP_LIMIT,
            min_occurrences: None,
        }
    }
}

/// Most frequent company authors, by descending count.
///
/// An absent or empty collection yields an empty list.
pub async fn top_companies(
    store: &dyn VectorStore,
    collection: &str,
    options: TopCompaniesOptions,
) -> Result<Vec<CompanyCount>, CoreError> {
    if options.limit == 0 {
        return Err(CoreError::validation("limit", "must be greater than 0"));
    }
    if !store
        .collection_exists(collection)
        .await
        .map_err(|e| CoreError::backend("top_companies", e))?
    {
        debug!("Collection {} missing, no companies to report", collection);
        return Ok(Vec::new());
    }

    let occurrences = store
        .top_occurrences(collection, COMPANY_FIELD, options.limit, options.min_occurrences)
        .await
        .map_err(|e| CoreError::backend("top_companies", e))?;

    Ok(occurrences
        .into_iter()
        .map(|o| CompanyCount {
            company: o.value,
            count: o.count,
        })
        .collect())
}

/// Headline cluster numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterStats {
    pub multi_tenancy: bool,
    /// Tenant count when multi-tenant, object count otherwise
    pub count: u64,
    pub node_count: usize,
    pub nodes: Vec<NodeInfo>,
}

impl ClusterStats {
    pub fn count_label(&self) -> &'static str {
        if self.multi_tenancy {
            "tenants"
        } else {
            "objects"
        }
    }
}

pub async fn cluster_stats(store: &dyn VectorStore, collection: &str) -> Result<ClusterStats, CoreError> {
    let to_core = |e: StoreError| CoreError::backend("cluster_stats", e);

    let multi_tenancy = store.multi_tenancy_enabled(collection).await.map_err(to_core)?;
    let count = if multi_tenancy {
        store.tenants(collection).await.map_err(to_core)?.len() as u64
    } else {
        store.total_count(collection).await.map_err(to_core)?
    };
    let nodes = store.nodes().await.map_err(to_core)?;

    Ok(ClusterStats {
        multi_tenancy,
        count,
        node_count: nodes.len(),
        nodes,
    })
}
