// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Live metrics for the dashboard

pub mod poller;
pub mod sources;

pub use poller::{MetricRing, MetricSample, MetricsPoller};
pub use sources::{
    parse_pprof_total, MetricSource, ObjectCountSource, PprofHeapSource, ProcessMemorySource,
    SampleError,
};
