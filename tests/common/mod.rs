// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures for the integration suites

#![allow(dead_code)]

use std::sync::Arc;
use supportchat_rag::config::AppConfig;
use supportchat_rag::records::{ConversationRecord, RawRow};
use supportchat_rag::store::{InMemoryStore, VectorStore};
use supportchat_rag::SearchService;

pub const COLLECTION: &str = "SupportChat";

pub fn row(text: &str, dialogue_id: i64, company: &str) -> RawRow {
    RawRow::new(text, dialogue_id, company, "Tue Oct 31 22:10:47 +0000 2017")
}

/// Three AmazonHelp turns and one Delta turn
pub fn support_rows() -> Vec<RawRow> {
    vec![
        row("please process my return", 1, "AmazonHelp"),
        row("your package is on the way", 2, "AmazonHelp"),
        row("we have refunded your order", 3, "AmazonHelp"),
        row("your flight to atlanta has been rebooked", 4, "Delta"),
    ]
}

pub async fn empty_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::default());
    store
        .create_collection(&store.support_chat_config(COLLECTION))
        .await
        .unwrap();
    store
}

pub async fn seeded_store(rows: Vec<RawRow>) -> Arc<InMemoryStore> {
    let store = empty_store().await;
    let records: Vec<ConversationRecord> = rows
        .into_iter()
        .map(|r| ConversationRecord::from_raw(r, 8000).unwrap())
        .collect();
    let outcome = store.insert_batch(COLLECTION, records).await.unwrap();
    assert!(outcome.failed.is_empty());
    store
}

pub fn search_service(store: Arc<InMemoryStore>) -> SearchService {
    SearchService::new(store, COLLECTION, AppConfig::default().query)
}
