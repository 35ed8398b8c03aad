// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use supportchat_rag::embeddings::{cosine_similarity, HashingVectorizer, Vectorizer};
use supportchat_rag::query::{QuerySpec, SearchMode, MAX_LIMIT};
use supportchat_rag::records::{RawRow, TEXT_VECTOR, TEXT_WITH_METADATA_VECTOR};

use crate::common::{row, search_service, seeded_store, support_rows};

const ANCHORS: [&str; 6] = [
    "refund for a damaged order",
    "courier lost the parcel",
    "order arrived late again",
    "baggage missing after landing",
    "refund order status please",
    "seat upgrade on the return flight",
];

/// Rows whose stored vectors come from `ANCHORS`, whatever their text says
fn anchored_rows(text: impl Fn(usize) -> String) -> Vec<RawRow> {
    let vectorizer = HashingVectorizer::default();
    ANCHORS
        .iter()
        .enumerate()
        .map(|(i, anchor)| {
            let mut raw = row(&text(i), i as i64, "AmazonHelp");
            let vector = vectorizer.vectorize(anchor);
            raw.vectors.insert(TEXT_VECTOR.to_string(), vector.clone());
            raw.vectors.insert(TEXT_WITH_METADATA_VECTOR.to_string(), vector);
            raw
        })
        .collect()
}

async fn vector_ranking(rows: Vec<RawRow>, query: &str) -> Vec<i64> {
    let service = search_service(seeded_store(rows).await);
    let results = service
        .search(&QuerySpec::new(query, ANCHORS.len(), SearchMode::Vector))
        .await
        .unwrap();
    results
        .items
        .iter()
        .map(|item| item.record.properties.dialogue_id)
        .collect()
}

#[tokio::test]
async fn test_keyword_returns_lexical_matches_only() {
    let service = search_service(seeded_store(support_rows()).await);
    let spec = QuerySpec::new("flight", 5, SearchMode::Keyword);

    let results = service.search(&spec).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results.items[0].record.properties.company_author, "Delta");
    assert_eq!(results.mode, SearchMode::Keyword);
}

#[tokio::test]
async fn test_keyword_ranks_more_matches_first() {
    let rows = vec![
        row("refund refund refund please", 1, "AmazonHelp"),
        row("one refund", 2, "AmazonHelp"),
        row("nothing related", 3, "Delta"),
    ];
    let service = search_service(seeded_store(rows).await);

    let results = service
        .search(&QuerySpec::new("refund", 5, SearchMode::Keyword))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results.items[0].record.properties.dialogue_id, 1);
    assert!(results.items[0].score >= results.items[1].score);
}

#[tokio::test]
async fn test_vector_ranking_ignores_token_overlap() {
    let query = "refund order";
    let unrelated = vector_ranking(anchored_rows(|i| format!("zebra quartz {}", i)), query).await;
    let overlapping = vector_ranking(
        anchored_rows(|i| format!("refund order {}", "refund order ".repeat(5 - i))),
        query,
    )
    .await;

    assert_eq!(unrelated.len(), ANCHORS.len());
    assert_eq!(unrelated, overlapping);

    let query_vector = HashingVectorizer::default().vectorize(query);
    let best = ANCHORS
        .iter()
        .enumerate()
        .map(|(i, anchor)| {
            let v = HashingVectorizer::default().vectorize(anchor);
            (i as i64, cosine_similarity(&query_vector, &v))
        })
        .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });
    assert_eq!(unrelated[0], best.0);
}

#[tokio::test]
async fn test_results_never_exceed_limit() {
    let rows = (0..30)
        .map(|i| row(&format!("where is my order number {}", i), i, "AmazonHelp"))
        .collect();
    let service = search_service(seeded_store(rows).await);

    for mode in [SearchMode::Hybrid, SearchMode::Vector, SearchMode::Keyword] {
        for limit in [1, 7, MAX_LIMIT] {
            let results = service
                .search(&QuerySpec::new("order", limit, mode))
                .await
                .unwrap();
            assert!(results.len() <= limit, "{} returned {} > {}", mode, results.len(), limit);
        }
    }
}

#[tokio::test]
async fn test_limit_outside_bounds_rejected() {
    let service = search_service(seeded_store(support_rows()).await);

    for limit in [0, MAX_LIMIT + 1] {
        let err = service
            .search(&QuerySpec::new("order", limit, SearchMode::Hybrid))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_previews_are_truncated() {
    let long = "a".repeat(120);
    let service = search_service(seeded_store(vec![row(&long, 1, "Delta")]).await);

    let results = service
        .search(&QuerySpec::new("anything", 1, SearchMode::Vector))
        .await
        .unwrap();
    assert_eq!(results.items[0].preview.chars().count(), 50);
}

#[tokio::test]
async fn test_generation_without_module_keeps_results() {
    let service = search_service(seeded_store(support_rows()).await);
    let spec = QuerySpec::new("package", 3, SearchMode::Hybrid)
        .with_generation("Summarise the customer issues");

    let results = service.search(&spec).await.unwrap();
    assert!(!results.is_empty());
    assert!(results.generated.is_none());
}

#[test]
fn test_alpha_table() {
    assert_eq!(SearchMode::Hybrid.alpha(), 0.5);
    assert_eq!(SearchMode::Vector.alpha(), 1.0);
    assert_eq!(SearchMode::Keyword.alpha(), 0.0);
}
