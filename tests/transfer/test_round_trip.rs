// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::sync::Arc;
use supportchat_rag::store::{InMemoryStore, VectorStore};
use supportchat_rag::transfer::BulkTransfer;
use tempfile::TempDir;

use crate::common::{empty_store, row, seeded_store, support_rows, COLLECTION};

async fn all_records(store: &InMemoryStore) -> Vec<supportchat_rag::ConversationRecord> {
    store.iterate(COLLECTION, None, 1000).await.unwrap()
}

#[tokio::test]
async fn test_round_trip_is_bit_exact() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("support.scvx");

    let source = seeded_store(support_rows()).await;
    let exported = BulkTransfer::new(source.clone(), COLLECTION)
        .export(&path, usize::MAX)
        .await
        .unwrap();
    assert_eq!(exported, 4);

    let target = empty_store().await;
    let report = BulkTransfer::new(target.clone(), COLLECTION)
        .import(&path, 3)
        .await
        .unwrap();
    assert_eq!(report.submitted, 4);
    assert_eq!(report.batches, 2);

    let before = all_records(&source).await;
    let after = all_records(&target).await;
    assert_eq!(before.len(), after.len());
    for (a, b) in before.iter().zip(after.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.properties, b.properties);
        for (name, vector) in &a.vectors {
            let restored = &b.vectors[name];
            let bits: Vec<u32> = vector.iter().map(|v| v.to_bits()).collect();
            let restored_bits: Vec<u32> = restored.iter().map(|v| v.to_bits()).collect();
            assert_eq!(bits, restored_bits, "vector {} changed", name);
        }
    }
}

#[tokio::test]
async fn test_export_stops_at_max_objects() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.scvx");
    let rows = (0..250).map(|i| row(&format!("turn {}", i), i, "Delta")).collect();

    let exported = BulkTransfer::new(seeded_store(rows).await, COLLECTION)
        .export(&path, 120)
        .await
        .unwrap();
    assert_eq!(exported, 120);

    let target = empty_store().await;
    BulkTransfer::new(target.clone(), COLLECTION)
        .import(&path, 50)
        .await
        .unwrap();
    assert_eq!(target.total_count(COLLECTION).await.unwrap(), 120);
}

#[tokio::test]
async fn test_second_export_to_same_path_refused() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("support.scvx");
    let transfer = BulkTransfer::new(seeded_store(support_rows()).await, COLLECTION);

    transfer.export(&path, usize::MAX).await.unwrap();
    let written = std::fs::read(&path).unwrap();

    let err = transfer.export(&path, usize::MAX).await.unwrap_err();
    assert_eq!(err.error_code(), "DESTINATION_EXISTS");
    assert!(err.to_string().contains("Please remove it first"));
    assert_eq!(std::fs::read(&path).unwrap(), written);
}

#[tokio::test]
async fn test_reimport_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("support.scvx");
    let store = seeded_store(support_rows()).await;
    BulkTransfer::new(store.clone(), COLLECTION)
        .export(&path, usize::MAX)
        .await
        .unwrap();

    let report = BulkTransfer::new(store.clone(), COLLECTION)
        .import(&path, 10)
        .await
        .unwrap();
    assert_eq!(report.submitted, 0);
    assert_eq!(report.skipped, 4);
}

#[tokio::test]
async fn test_import_of_garbage_is_container_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("garbage.scvx");
    std::fs::write(&path, b"definitely not a container").unwrap();

    let err = BulkTransfer::new(Arc::new(InMemoryStore::default()), COLLECTION)
        .import(&path, 10)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CONTAINER_ERROR");
}
