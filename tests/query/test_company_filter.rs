// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use supportchat_rag::query::{QuerySpec, SearchMode};

use crate::common::{search_service, seeded_store, support_rows};

#[tokio::test]
async fn test_amazon_filter_includes_return_request() {
    let service = search_service(seeded_store(support_rows()).await);
    let spec = QuerySpec::new("returns", 5, SearchMode::Hybrid).with_company_filter("*amazon*");

    let results = service.search(&spec).await.unwrap();

    assert!(results
        .items
        .iter()
        .any(|item| item.record.properties.text == "please process my return"));
    assert!(results
        .items
        .iter()
        .all(|item| item.record.properties.company_author == "AmazonHelp"));
}

#[tokio::test]
async fn test_delta_filter_excludes_return_request() {
    let service = search_service(seeded_store(support_rows()).await);
    let spec = QuerySpec::new("returns", 5, SearchMode::Hybrid).with_company_filter("*delta*");

    let results = service.search(&spec).await.unwrap();

    assert!(!results
        .items
        .iter()
        .any(|item| item.record.properties.company_author == "AmazonHelp"));
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_filter_without_match_is_empty() {
    let service = search_service(seeded_store(support_rows()).await);
    let spec = QuerySpec::new("flight", 5, SearchMode::Hybrid).with_company_filter("*united*");

    let results = service.search(&spec).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_empty_filter_searches_everything() {
    let service = search_service(seeded_store(support_rows()).await);
    let spec = QuerySpec::new("your", 20, SearchMode::Vector).with_company_filter("");

    let results = service.search(&spec).await.unwrap();
    assert_eq!(results.len(), 4);
}

#[tokio::test]
async fn test_malformed_pattern_is_validation_error() {
    let service = search_service(seeded_store(support_rows()).await);
    let spec = QuerySpec::new("returns", 5, SearchMode::Hybrid).with_company_filter("*".repeat(300));

    let err = service.search(&spec).await.unwrap_err();
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}
