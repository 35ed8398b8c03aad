// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval-augmented query pipeline

pub mod builder;
pub mod mode;
pub mod service;
pub mod types;

pub use builder::{build_request, COMPANY_FIELD};
pub use mode::SearchMode;
pub use service::SearchService;
pub use types::{QuerySpec, ResultItem, ResultSet, MAX_LIMIT, MIN_LIMIT};
