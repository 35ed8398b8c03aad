// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::app::App;
use crate::ingest::{IngestOptions, IngestReport};
use crate::records::JsonlSource;
use crate::transfer::BulkTransfer;

/// Arguments for create-collection command
#[derive(Args, Debug)]
pub struct CreateCollectionArgs {
    /// Delete an existing collection of the same name first
    #[arg(long)]
    pub force: bool,
}

/// Arguments for ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// JSON Lines file, one row per line
    pub path: PathBuf,

    /// Pace submissions by requests per minute instead of fixed batches
    #[arg(long)]
    pub rate_limited: bool,

    /// Stop after this many rows (defaults to INGEST_MAX_OBJECTS)
    #[arg(long)]
    pub max_objects: Option<usize>,
}

/// Arguments for export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Container file to create; must not exist
    pub destination: PathBuf,

    /// Export at most this many objects
    #[arg(long)]
    pub max_objects: Option<usize>,
}

/// Arguments for import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Container file written by `export`
    pub source: PathBuf,

    /// Objects per batch (defaults to INGEST_BATCH_SIZE)
    #[arg(long)]
    pub batch_size: Option<usize>,
}

pub async fn create_collection(app: &App, args: CreateCollectionArgs) -> Result<()> {
    let name = app.collection();
    if app.store.collection_exists(name).await? {
        if !args.force {
            warn!("Collection {} already exists, pass --force to recreate it", name);
            return Ok(());
        }
        app.store.delete_collection(name).await?;
        info!("Deleted existing collection {}", name);
    }

    app.store.create_collection(&app.collection_config()).await?;
    println!("✅ Created collection {}", name);
    Ok(())
}

pub async fn ingest(app: &App, args: IngestArgs) -> Result<()> {
    let settings = &app.config.ingest;
    let mut options = if args.rate_limited {
        IngestOptions::rate_limited(settings)
    } else {
        IngestOptions::fixed_size(settings)
    };
    if let Some(max) = args.max_objects {
        options = options.with_max_objects(max);
    }

    let rows = JsonlSource::open(&args.path)?;
    let report = app.ingest_engine().ingest_iter(rows, options).await?;
    print_report(&report);
    Ok(report.into_result().map(|_| ())?)
}

pub async fn export(app: &App, args: ExportArgs) -> Result<()> {
    let transfer = BulkTransfer::new(app.store.clone(), app.collection());
    let max = args.max_objects.unwrap_or(usize::MAX);
    let count = transfer.export(&args.destination, max).await?;
    println!("✅ Exported {} objects to {}", count, args.destination.display());
    Ok(())
}

pub async fn import(app: &App, args: ImportArgs) -> Result<()> {
    let transfer = BulkTransfer::new(app.store.clone(), app.collection());
    let batch_size = args.batch_size.unwrap_or(app.config.ingest.batch_size);
    let report = transfer.import(&args.source, batch_size).await?;
    print_report(&report);
    Ok(report.into_result().map(|_| ())?)
}

fn print_report(report: &IngestReport) {
    println!(
        "Processed {} rows: {} submitted, {} skipped, {} failed in {} batches",
        report.processed, report.submitted, report.skipped, report.failed_count, report.batches
    );
    if report.reached_max_objects {
        println!("Stopped at the object limit");
    }
    for failure in &report.failed_sample {
        println!(
            "  ❌ {} (batch {}): {}",
            failure.id, failure.batch_index, failure.message
        );
    }
}
