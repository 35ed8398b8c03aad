// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::io::Write;
use supportchat_rag::config::AppConfig;
use supportchat_rag::ingest::{IngestEngine, IngestOptions};
use supportchat_rag::records::JsonlSource;
use supportchat_rag::store::VectorStore;

use crate::common::{empty_store, COLLECTION};

#[tokio::test]
async fn test_ingest_from_jsonl_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"{{"text":"@AmazonHelp where is my parcel","dialogue_id":10,"company_author":"AmazonHelp","created_at":"Tue Oct 31 22:10:47 +0000 2017"}}"#
    )
    .unwrap();
    writeln!(file).unwrap();
    writeln!(
        file,
        r#"{{"text":"@Delta my bag is missing","dialogue_id":11,"company_author":"Delta","raw_timestamp":"2017-10-31T22:11:02Z"}}"#
    )
    .unwrap();

    let store = empty_store().await;
    let engine = IngestEngine::new(store.clone(), COLLECTION);
    let source = JsonlSource::open(file.path()).unwrap();
    let report = engine
        .ingest_iter(source, IngestOptions::fixed_size(&AppConfig::default().ingest))
        .await
        .unwrap();

    assert_eq!(report.processed, 2);
    assert_eq!(report.submitted, 2);
    assert_eq!(store.total_count(COLLECTION).await.unwrap(), 2);
}

#[tokio::test]
async fn test_malformed_line_is_source_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "{{not json").unwrap();

    let store = empty_store().await;
    let engine = IngestEngine::new(store, COLLECTION);
    let source = JsonlSource::open(file.path()).unwrap();
    let err = engine
        .ingest_iter(source, IngestOptions::fixed_size(&AppConfig::default().ingest))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "SOURCE_ERROR");
}
