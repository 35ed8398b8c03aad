// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use supportchat_rag::config::AppConfig;
use supportchat_rag::monitoring::{MetricSource, MetricsPoller, ObjectCountSource, SampleError};

use crate::common::{seeded_store, support_rows, COLLECTION};

struct Sequence(AtomicU64);

#[async_trait]
impl MetricSource for Sequence {
    async fn sample(&self) -> Result<f64, SampleError> {
        Ok((self.0.fetch_add(1, Ordering::SeqCst) + 1) as f64)
    }

    fn name(&self) -> &'static str {
        "sequence"
    }
}

#[tokio::test]
async fn test_ring_holds_last_fifty() {
    let poller = MetricsPoller::new(
        Arc::new(Sequence(AtomicU64::new(0))),
        &AppConfig::default().poller,
    );

    for _ in 0..51 {
        assert!(poller.tick().await);
    }

    let samples = poller.snapshot().await;
    assert_eq!(samples.len(), 50);
    assert_eq!(samples[0].value, 2.0);
    assert_eq!(samples[49].value, 51.0);
    assert!(!samples.iter().any(|s| s.value == 1.0));
}

#[tokio::test]
async fn test_object_count_tracks_store() {
    let store = seeded_store(support_rows()).await;
    let poller = MetricsPoller::new(
        Arc::new(ObjectCountSource::new(store, COLLECTION)),
        &AppConfig::default().poller,
    );

    poller.tick().await;
    assert_eq!(poller.latest().await.unwrap().value, 4.0);
    assert_eq!(poller.source_name(), "object_count");
}

#[tokio::test]
async fn test_failing_source_leaves_ring_empty() {
    let poller = MetricsPoller::new(
        Arc::new(ObjectCountSource::new(seeded_store(vec![]).await, "Missing")),
        &AppConfig::default().poller,
    );

    assert!(!poller.tick().await);
    assert!(poller.snapshot().await.is_empty());
}
