// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded-history metrics poller
//!
//! Samples one `MetricSource` on a fixed interval into a ring of the most
//! recent samples. A failed sample skips the tick. Each append (with any
//! eviction) happens under one write lock, so readers never see a
//! half-applied tick, and cancellation is only observed between ticks.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sources::MetricSource;
use crate::config::PollerSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// Wall-clock time of the sample, `HH:MM:SS`
    pub label: String,
    pub value: f64,
}

/// Fixed-capacity FIFO of samples
#[derive(Debug, Clone)]
pub struct MetricRing {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl MetricRing {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append, evicting from the front once over capacity
    pub fn push(&mut self, sample: MetricSample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<MetricSample> {
        self.samples.iter().cloned().collect()
    }
}

pub struct MetricsPoller {
    source: Arc<dyn MetricSource>,
    ring: RwLock<MetricRing>,
    interval: Duration,
}

impl MetricsPoller {
    pub fn new(source: Arc<dyn MetricSource>, settings: &PollerSettings) -> Self {
        Self {
            source,
            ring: RwLock::new(MetricRing::new(settings.capacity)),
            interval: settings.interval,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Take one sample. Returns whether a sample was appended.
    pub async fn tick(&self) -> bool {
        match self.source.sample().await {
            Ok(value) => {
                let sample = MetricSample {
                    label: Local::now().format("%H:%M:%S").to_string(),
                    value,
                };
                debug!("{} sample {} = {}", self.source.name(), sample.label, value);
                self.ring.write().await.push(sample);
                true
            }
            Err(e) => {
                warn!("{} sample failed, skipping tick: {}", self.source.name(), e);
                false
            }
        }
    }

    /// Current ring contents, oldest first
    pub async fn snapshot(&self) -> Vec<MetricSample> {
        self.ring.read().await.to_vec()
    }

    pub async fn latest(&self) -> Option<MetricSample> {
        self.ring.read().await.samples.back().cloned()
    }

    /// Run until `token` is cancelled
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            "Polling {} every {}ms",
            self.source.name(),
            self.interval.as_millis()
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
        info!("Stopped polling {}", self.source.name());
    }

    pub fn spawn(self: Arc<Self>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(token).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::monitoring::sources::SampleError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Counts up from 1; fails on every multiple of `fail_every`
    struct Counter {
        next: AtomicU64,
        fail_every: u64,
    }

    #[async_trait]
    impl MetricSource for Counter {
        async fn sample(&self) -> Result<f64, SampleError> {
            let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_every > 0 && n % self.fail_every == 0 {
                return Err(SampleError::Unavailable("flaky".to_string()));
            }
            Ok(n as f64)
        }

        fn name(&self) -> &'static str {
            "counter"
        }
    }

    fn poller(fail_every: u64) -> MetricsPoller {
        let source = Arc::new(Counter {
            next: AtomicU64::new(0),
            fail_every,
        });
        MetricsPoller::new(source, &AppConfig::default().poller)
    }

    #[test]
    fn test_ring_evicts_oldest() {
        let mut ring = MetricRing::new(2);
        for v in [1.0, 2.0, 3.0] {
            ring.push(MetricSample {
                label: "00:00:00".to_string(),
                value: v,
            });
        }
        let values: Vec<f64> = ring.to_vec().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_failed_tick_appends_nothing() {
        let poller = poller(2);
        assert!(poller.tick().await);
        assert!(!poller.tick().await);
        assert!(poller.tick().await);
        let values: Vec<f64> = poller.snapshot().await.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[tokio::test]
    async fn test_label_format() {
        let poller = poller(0);
        poller.tick().await;
        let label = poller.latest().await.unwrap().label;
        assert_eq!(label.len(), 8);
        assert_eq!(label.matches(':').count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_stops() {
        let mut settings = AppConfig::default().poller;
        settings.interval = Duration::from_millis(5);
        let source = Arc::new(Counter {
            next: AtomicU64::new(0),
            fail_every: 0,
        });
        let poller = Arc::new(MetricsPoller::new(source, &settings));
        let token = CancellationToken::new();
        let handle = poller.clone().spawn(token.clone());

        tokio::time::sleep(Duration::from_millis(40)).await;
        token.cancel();
        handle.await.unwrap();

        let taken = poller.snapshot().await.len();
        assert!(taken >= 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(poller.snapshot().await.len(), taken);
    }
}
