// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Scalar metric sources sampled by the poller

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use sysinfo::{Pid, System};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use crate::store::{StoreError, VectorStore};

#[derive(Error, Debug)]
pub enum SampleError {
    #[error("Command failed: {0}")]
    Command(String),

    #[error("Sampling timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Unrecognised output: {0}")]
    Parse(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Metric unavailable: {0}")]
    Unavailable(String),
}

/// One scalar measurement per call
#[async_trait]
pub trait MetricSource: Send + Sync {
    async fn sample(&self) -> Result<f64, SampleError>;

    fn name(&self) -> &'static str;
}

fn pprof_total_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Showing nodes accounting for [\d.]+[kMG]?B, [\d.]+% of ([\d.]+)([kMG]?B) total").ok()
    })
    .as_ref()
}

/// Total heap in MB from `go tool pprof -top` output
pub fn parse_pprof_total(output: &str) -> Option<f64> {
    let caps = pprof_total_regex()?.captures(output)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2)?.as_str() {
        "B" => 1.0 / (1024.0 * 1024.0),
        "kB" => 1.0 / 1024.0,
        "GB" => 1024.0,
        _ => 1.0,
    };
    Some(value * scale)
}

/// Heap size of a Go service, read through its pprof endpoint
pub struct PprofHeapSource {
    program: String,
    url: String,
    timeout: Duration,
}

impl PprofHeapSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: "go".to_string(),
            url: url.into(),
            timeout,
        }
    }

    /// Use a different `go` binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl MetricSource for PprofHeapSource {
    async fn sample(&self) -> Result<f64, SampleError> {
        let run = Command::new(&self.program)
            .args(["tool", "pprof", "-top", &self.url])
            .kill_on_drop(true)
            .output();

        let output = timeout(self.timeout, run)
            .await
            .map_err(|_| SampleError::Timeout {
                secs: self.timeout.as_secs(),
            })?
            .map_err(|e| SampleError::Command(format!("{}: {}", self.program, e)))?;

        // pprof prints its summary on stdout, some versions on stderr
        let text = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        parse_pprof_total(&text).ok_or_else(|| {
            SampleError::Parse(text.lines().next().unwrap_or_default().to_string())
        })
    }

    fn name(&self) -> &'static str {
        "pprof_heap_mb"
    }
}

/// Resident memory of this process in MB
pub struct ProcessMemorySource {
    system: Mutex<System>,
    pid: Pid,
}

impl ProcessMemorySource {
    pub fn new() -> Result<Self, SampleError> {
        let pid = sysinfo::get_current_pid().map_err(|e| SampleError::Unavailable(e.to_string()))?;
        Ok(Self {
            system: Mutex::new(System::new()),
            pid,
        })
    }
}

#[async_trait]
impl MetricSource for ProcessMemorySource {
    async fn sample(&self) -> Result<f64, SampleError> {
        let mut system = self
            .system
            .lock()
            .map_err(|_| SampleError::Unavailable("system handle poisoned".to_string()))?;
        system.refresh_process(self.pid);
        system
            .process(self.pid)
            .map(|p| p.memory() as f64 / (1024.0 * 1024.0))
            .ok_or_else(|| SampleError::Unavailable(format!("process {} not found", self.pid)))
    }

    fn name(&self) -> &'static str {
        "process_memory_mb"
    }
}

/// Object count of a collection
pub struct ObjectCountSource {
    store: Arc<dyn VectorStore>,
    collection: String,
}

impl ObjectCountSource {
    pub fn new(store: Arc<dyn VectorStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }
}

#[async_trait]
impl MetricSource for ObjectCountSource {
    async fn sample(&self) -> Result<f64, SampleError> {
        Ok(self.store.total_count(&self.collection).await? as f64)
    }

    fn name(&self) -> &'static str {
        "object_count"
    }
}
