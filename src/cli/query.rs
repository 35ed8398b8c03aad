// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;

use crate::aggregation::{self, TopCompaniesOptions, DEFAULT_TOP_LIMIT};
use crate::app::App;
use crate::query::{QuerySpec, SearchMode};

/// Arguments for search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query
    pub query: String,

    /// Wildcard pattern on company_author, e.g. "*amazon*"
    #[arg(long)]
    pub company: Option<String>,

    /// Number of results, 1 to 20 (defaults to QUERY_DEFAULT_LIMIT)
    #[arg(long)]
    pub limit: Option<usize>,

    /// hybrid, vector or keyword
    #[arg(long, default_value = "hybrid")]
    pub mode: SearchMode,

    /// Instruction for a grounded answer over the results
    #[arg(long)]
    pub generate: Option<String>,
}

/// Arguments for top-companies command
#[derive(Args, Debug)]
pub struct TopCompaniesArgs {
    #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
    pub limit: usize,

    /// Drop companies with fewer turns than this
    #[arg(long)]
    pub min_occurrences: Option<u64>,
}

pub async fn search(app: &App, args: SearchArgs) -> Result<()> {
    let service = app.search_service();
    let mut spec = QuerySpec::new(
        args.query,
        args.limit.unwrap_or_else(|| service.default_limit()),
        args.mode,
    );
    if let Some(company) = args.company {
        spec = spec.with_company_filter(company);
    }
    if let Some(instruction) = args.generate {
        spec = spec.with_generation(instruction);
    }

    let results = service.search(&spec).await?;
    println!("{} results for {:?} ({})", results.len(), results.query, results.mode);
    for (rank, item) in results.items.iter().enumerate() {
        println!(
            "{:>2}. [{:.3}] {} #{}: {}",
            rank + 1,
            item.score,
            item.record.properties.company_author,
            item.record.properties.dialogue_id,
            item.preview
        );
    }
    if let Some(generated) = results.generated {
        println!("\n{}", generated);
    }
    Ok(())
}

pub async fn top_companies(app: &App, args: TopCompaniesArgs) -> Result<()> {
    let options = TopCompaniesOptions {
        limit: args.limit,
        min_occurrences: args.min_occurrences,
    };
    let top = aggregation::top_companies(app.store.as_ref(), app.collection(), options).await?;
    if top.is_empty() {
        println!("No companies found in {}", app.collection());
    }
    for entry in top {
        println!("{:>8}  {}", entry.count, entry.company);
    }
    Ok(())
}

pub async fn cluster_stats(app: &App) -> Result<()> {
    let stats = aggregation::cluster_stats(app.store.as_ref(), app.collection()).await?;
    println!("{}: {} {}", app.collection(), stats.count, stats.count_label());
    println!("Nodes: {}", stats.node_count);
    for node in &stats.nodes {
        println!(
            "  {} {} {}",
            node.name,
            node.status,
            node.version.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
