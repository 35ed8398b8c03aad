// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Translate a `QuerySpec` into a store retrieval request

use super::types::QuerySpec;
use crate::errors::CoreError;
use crate::store::{Filter, HybridQuery, WildcardPattern};

/// Field the company filter applies to
pub const COMPANY_FIELD: &str = "company_author";

/// Build the hybrid request for `spec`, targeting `target_vector`.
///
/// # Errors
/// `CoreError::Validation` for an out-of-range limit or a malformed pattern
pub fn build_request(spec: &QuerySpec, target_vector: &str) -> Result<HybridQuery, CoreError> {
    spec.validate()?;

    let filter = if spec.company_filter.is_empty() {
        None
    } else {
        WildcardPattern::compile(&spec.company_filter)
            .map_err(|e| CoreError::validation("company_filter", e.to_string()))?;
        Some(Filter::Like {
            property: COMPANY_FIELD.to_string(),
            pattern: spec.company_filter.clone(),
        })
    };

    Ok(HybridQuery {
        query: spec.query.clone(),
        alpha: spec.mode.alpha(),
        target_vector: target_vector.to_string(),
        filter,
        limit: spec.limit,
        grouped_task: spec.instruction().map(str::to_string),
    })
}
