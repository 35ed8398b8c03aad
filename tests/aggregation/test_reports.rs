// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use supportchat_rag::aggregation::{cluster_stats, top_companies, CompanyCount, TopCompaniesOptions};
use tokio_test::{assert_err, assert_ok};

use crate::common::{row, seeded_store, support_rows, COLLECTION};

fn count(company: &str, count: u64) -> CompanyCount {
    CompanyCount {
        company: company.to_string(),
        count,
    }
}

#[tokio::test]
async fn test_top_companies_ranked_by_count() {
    let store = seeded_store(support_rows()).await;

    let top = top_companies(store.as_ref(), COLLECTION, TopCompaniesOptions::default())
        .await
        .unwrap();

    assert_eq!(top, vec![count("AmazonHelp", 3), count("Delta", 1)]);
}

#[tokio::test]
async fn test_top_companies_limit_and_threshold() {
    let mut rows = support_rows();
    rows.push(row("train is late", 5, "SW_Help"));
    rows.push(row("train is still late", 6, "SW_Help"));
    let store = seeded_store(rows).await;

    let limited = top_companies(
        store.as_ref(),
        COLLECTION,
        TopCompaniesOptions {
            limit: 2,
            min_occurrences: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(limited, vec![count("AmazonHelp", 3), count("SW_Help", 2)]);

    let frequent = top_companies(
        store.as_ref(),
        COLLECTION,
        TopCompaniesOptions {
            limit: 5,
            min_occurrences: Some(2),
        },
    )
    .await
    .unwrap();
    assert_eq!(frequent.len(), 2);
    assert!(frequent.iter().all(|c| c.count >= 2));
}

#[tokio::test]
async fn test_cluster_stats_reports_object_count() {
    let store = seeded_store(support_rows()).await;

    let stats = assert_ok!(cluster_stats(store.as_ref(), COLLECTION).await);

    assert!(!stats.multi_tenancy);
    assert_eq!(stats.count, 4);
    assert_eq!(stats.count_label(), "objects");
    assert_eq!(stats.node_count, 1);
    assert_eq!(stats.nodes[0].status, "HEALTHY");
}

#[tokio::test]
async fn test_zero_limit_rejected() {
    let store = seeded_store(support_rows()).await;
    let options = TopCompaniesOptions {
        limit: 0,
        min_occurrences: None,
    };

    let err = assert_err!(top_companies(store.as_ref(), COLLECTION, options).await);
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}
