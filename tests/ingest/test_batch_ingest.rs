// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use supportchat_rag::config::AppConfig;
use supportchat_rag::ingest::{IngestEngine, IngestOptions};
use supportchat_rag::records::{NamedVectors, RawRow, TEXT_VECTOR};
use supportchat_rag::store::VectorStore;
use supportchat_rag::CoreError;

use crate::common::{empty_store, row, support_rows, COLLECTION};

fn fixed(batch_size: usize) -> IngestOptions {
    let mut settings = AppConfig::default().ingest;
    settings.batch_size = batch_size;
    IngestOptions::fixed_size(&settings)
}

fn ok_rows(rows: Vec<RawRow>) -> Vec<Result<RawRow, CoreError>> {
    rows.into_iter().map(Ok).collect()
}

#[tokio::test]
async fn test_second_ingest_adds_nothing() {
    let store = empty_store().await;
    let engine = IngestEngine::new(store.clone(), COLLECTION);

    let first = engine.ingest_iter(ok_rows(support_rows()), fixed(2)).await.unwrap();
    assert_eq!(first.submitted, 4);

    let second = engine.ingest_iter(ok_rows(support_rows()), fixed(2)).await.unwrap();
    assert_eq!(second.submitted, 0);
    assert_eq!(second.skipped, 4);
    assert_eq!(second.batches, 0);
    assert_eq!(store.total_count(COLLECTION).await.unwrap(), 4);
}

#[tokio::test]
async fn test_identical_content_gets_identical_id() {
    let store = empty_store().await;
    let engine = IngestEngine::new(store.clone(), COLLECTION);

    let report = engine
        .ingest_iter(
            ok_rows(vec![row("same text", 1, "Delta"), row("same text", 1, "Delta")]),
            fixed(10),
        )
        .await
        .unwrap();

    assert_eq!(report.submitted, 1);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_failed_batch_halts_run() {
    let store = empty_store().await;
    let engine = IngestEngine::new(store.clone(), COLLECTION);

    let mut bad = row("vector of the wrong size", 3, "Delta");
    let mut vectors = NamedVectors::new();
    vectors.insert(TEXT_VECTOR.to_string(), vec![0.5; 3]);
    bad.vectors = vectors;

    let rows = vec![
        row("first batch a", 1, "Delta"),
        row("first batch b", 2, "Delta"),
        bad,
        row("second batch ok", 4, "Delta"),
        row("never submitted", 5, "Delta"),
        row("never submitted either", 6, "Delta"),
    ];
    let report = engine.ingest_iter(ok_rows(rows), fixed(2)).await.unwrap();

    assert!(report.halted);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.failed_sample[0].batch_index, 1);
    assert!(report.failed_sample[0].message.contains("dimensions"));
    // First batch stays committed, plus the good half of the failing batch
    assert_eq!(report.batches, 2);
    assert_eq!(store.total_count(COLLECTION).await.unwrap(), 3);

    let err = report.into_result().unwrap_err();
    assert_eq!(err.error_code(), "PARTIAL_INGESTION_FAILURE");
}

#[tokio::test]
async fn test_source_error_stops_with_prior_batches_committed() {
    let store = empty_store().await;
    let engine = IngestEngine::new(store.clone(), COLLECTION);

    let rows = vec![
        Ok(row("committed", 1, "Delta")),
        Ok(RawRow::new("bad date", 2, "Delta", "yesterday-ish")),
    ];
    let err = engine.ingest_iter(rows, fixed(1)).await.unwrap_err();

    assert_eq!(err.error_code(), "TIMESTAMP_PARSE_ERROR");
    assert_eq!(store.total_count(COLLECTION).await.unwrap(), 1);
}

#[tokio::test]
async fn test_rate_limited_respects_max_objects() {
    let store = empty_store().await;
    let engine = IngestEngine::new(store.clone(), COLLECTION);

    let mut settings = AppConfig::default().ingest;
    settings.requests_per_minute = 6000;
    let rows = (0..10).map(|i| row(&format!("turn {}", i), i, "Delta")).collect();
    let report = engine
        .ingest_iter(ok_rows(rows), IngestOptions::rate_limited(&settings).with_max_objects(5))
        .await
        .unwrap();

    assert!(report.reached_max_objects);
    assert_eq!(report.submitted, 5);
    assert_eq!(store.total_count(COLLECTION).await.unwrap(), 5);
}

#[tokio::test]
async fn test_missing_collection_is_backend_error() {
    let store = empty_store().await;
    let engine = IngestEngine::new(store, "Elsewhere");

    let err = engine
        .ingest_iter(ok_rows(support_rows()), fixed(2))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "BACKEND_UNAVAILABLE");
}
