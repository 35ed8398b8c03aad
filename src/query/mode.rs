// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Retrieval mode selected by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Hybrid,
    Vector,
    Keyword,
}

/// Blend weight per mode. Fixed three-point table, not a slider.
const ALPHA_TABLE: [(SearchMode, f32); 3] = [
    (SearchMode::Keyword, 0.0),
    (SearchMode::Hybrid, 0.5),
    (SearchMode::Vector, 1.0),
];

impl SearchMode {
    pub fn alpha(&self) -> f32 {
        ALPHA_TABLE
            .iter()
            .find(|(mode, _)| mode == self)
            .map(|(_, alpha)| *alpha)
            .unwrap_or(0.5)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Hybrid => "hybrid",
            SearchMode::Vector => "vector",
            SearchMode::Keyword => "keyword",
        }
    }
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::Hybrid
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hybrid" => Ok(SearchMode::Hybrid),
            "vector" => Ok(SearchMode::Vector),
            "keyword" => Ok(SearchMode::Keyword),
            other => Err(format!(
                "unknown search mode '{}', choose from hybrid, vector, keyword",
                other
            )),
        }
    }
}
