// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batch disciplines and the submission rate limiter

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// How records are grouped into store submissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Vectors supplied by the caller; flush every `batch_size` records
    FixedSize { batch_size: usize },
    /// Store computes vectors; admit at most `requests_per_minute` records
    RateLimited { requests_per_minute: u32 },
}

impl BatchMode {
    /// Records per store submission
    pub fn batch_size(&self) -> usize {
        match self {
            BatchMode::FixedSize { batch_size } => (*batch_size).max(1),
            // one second's worth of quota per submission
            BatchMode::RateLimited { requests_per_minute } => {
                ((*requests_per_minute / 60) as usize).max(1)
            }
        }
    }

    pub fn limiter(&self) -> Option<IngestRateLimiter> {
        match self {
            BatchMode::FixedSize { .. } => None,
            BatchMode::RateLimited { requests_per_minute } => {
                Some(IngestRateLimiter::new(*requests_per_minute))
            }
        }
    }
}

/// Per-record admission limiter for rate-limited runs
#[derive(Clone)]
pub struct IngestRateLimiter {
    limiter: Arc<GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    requests_per_minute: u32,
}

impl IngestRateLimiter {
    /// Zero falls back to 60 per minute.
    ///
    /// Burst is pinned to one record, so admissions are spaced evenly and
    /// no 60-second window sees more than `requests_per_minute` of them.
    pub fn new(requests_per_minute: u32) -> Self {
        let rpm = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN.saturating_add(59));
        let quota = Quota::per_minute(rpm).allow_burst(NonZeroU32::MIN);
        let limiter = Arc::new(GovRateLimiter::direct(quota));

        Self {
            limiter,
            requests_per_minute: rpm.get(),
        }
    }

    /// Wait until one more record may be admitted
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Admit without waiting, if quota allows
    pub fn try_admit(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}
