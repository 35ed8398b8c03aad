// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod data;
pub mod query;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};

use crate::app::App;
use crate::config::AppConfig;

/// Support-chat RAG CLI
#[derive(Parser, Debug)]
#[command(name = "supportchat-cli")]
#[command(version = "1.0.0")]
#[command(about = "Manage and query the support-chat collection", long_about = None)]
pub struct Cli {
    /// Collection to operate on (overrides COLLECTION_NAME)
    #[arg(long, global = true)]
    pub collection: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the support-chat collection
    CreateCollection(data::CreateCollectionArgs),

    /// Load JSONL rows into the collection
    Ingest(data::IngestArgs),

    /// Write the collection to a container file
    Export(data::ExportArgs),

    /// Load a container file into the collection
    Import(data::ImportArgs),

    /// Run a hybrid, vector or keyword search
    Search(query::SearchArgs),

    /// Companies with the most turns
    TopCompanies(query::TopCompaniesArgs),

    /// Object/tenant count and node health
    ClusterStats,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(collection) = cli.collection {
        config.store.collection = collection;
    }
    config.validate().map_err(|e| anyhow!(e))?;

    let app = App::bootstrap(config).await?;

    match cli.command {
        Commands::CreateCollection(args) => data::create_collection(&app, args).await,
        Commands::Ingest(args) => data::ingest(&app, args).await,
        Commands::Export(args) => data::export(&app, args).await,
        Commands::Import(args) => data::import(&app, args).await,
        Commands::Search(args) => query::search(&app, args).await,
        Commands::TopCompanies(args) => query::top_companies(&app, args).await,
        Commands::ClusterStats => query::cluster_stats(&app).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "supportchat-cli",
            "search",
            "where is my parcel",
            "--company",
            "*amazon*",
            "--limit",
            "3",
            "--mode",
            "keyword",
        ])
        .unwrap();
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "where is my parcel");
                assert_eq!(args.company.as_deref(), Some("*amazon*"));
                assert_eq!(args.limit, Some(3));
                assert_eq!(args.mode, crate::query::SearchMode::Keyword);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_export_with_global_collection() {
        let cli = Cli::try_parse_from([
            "supportchat-cli",
            "export",
            "backup.scvx",
            "--max-objects",
            "10",
            "--collection",
            "Archive",
        ])
        .unwrap();
        assert_eq!(cli.collection.as_deref(), Some("Archive"));
        assert!(matches!(cli.command, Commands::Export(ref a) if a.max_objects == Some(10)));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["supportchat-cli", "search", "q", "--mode", "fuzzy"]).is_err());
    }
}
