//! Render metrics.
//!
//! Counters are atomics; recent durations are kept in a bounded sample
//! buffer for P50/P95/P99.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::models::FailureKind;

/// Maximum number of duration samples to keep in memory.
const MAX_DURATION_SAMPLES: usize = 1000;

/// Render metrics collector, shared by all pipeline runs.
#[derive(Debug)]
pub struct RenderMetrics {
    renders_started: AtomicU64,
    renders_succeeded: AtomicU64,
    renders_failed: AtomicU64,
    renders_timed_out: AtomicU64,
    renderer_unavailable: AtomicU64,
    validation_rejections: AtomicU64,
    total_output_bytes: AtomicU64,
    duration_samples: Mutex<Vec<Duration>>,
}

impl RenderMetrics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self {
            renders_started: AtomicU64::new(0),
            renders_succeeded: AtomicU64::new(0),
            renders_failed: AtomicU64::new(0),
            renders_timed_out: AtomicU64::new(0),
            renderer_unavailable: AtomicU64::new(0),
            validation_rejections: AtomicU64::new(0),
            total_output_bytes: AtomicU64::new(0),
            duration_samples: Mutex::new(Vec::with_capacity(MAX_DURATION_SAMPLES)),
        }
    }

    /// A request failed validation before any session existed.
    pub fn record_rejected(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// A renderer process is about to be spawned.
    pub fn record_started(&self) {
        self.renders_started.fetch_add(1, Ordering::Relaxed);
    }

    /// An artifact was delivered.
    pub fn record_success(&self, duration: Duration, output_bytes: u64) {
        self.renders_succeeded.fetch_add(1, Ordering::Relaxed);
        self.total_output_bytes
            .fetch_add(output_bytes, Ordering::Relaxed);
        self.add_duration_sample(duration);
    }

    /// A started render did not deliver an artifact.
    pub fn record_failure(&self, kind: FailureKind) {
        self.renders_failed.fetch_add(1, Ordering::Relaxed);
        match kind {
            FailureKind::TimedOut => {
                self.renders_timed_out.fetch_add(1, Ordering::Relaxed);
            }
            FailureKind::Unavailable => {
                self.renderer_unavailable.fetch_add(1, Ordering::Relaxed);
            }
            FailureKind::Rendering | FailureKind::NoOutput => {}
        }
    }

    /// A started render failed before the renderer ran (staging, marshaling).
    pub fn record_aborted(&self) {
        self.renders_failed.fetch_add(1, Ordering::Relaxed);
    }

    fn add_duration_sample(&self, duration: Duration) {
        if let Ok(mut samples) = self.duration_samples.lock() {
            if samples.len() >= MAX_DURATION_SAMPLES {
                samples.remove(0);
            }
            samples.push(duration);
        }
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let durations = self
            .duration_samples
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default();

        let (p50, p95, p99) = percentiles(&durations);

        MetricsSnapshot {
            renders_started: self.renders_started.load(Ordering::Relaxed),
            renders_succeeded: self.renders_succeeded.load(Ordering::Relaxed),
            renders_failed: self.renders_failed.load(Ordering::Relaxed),
            renders_timed_out: self.renders_timed_out.load(Ordering::Relaxed),
            renderer_unavailable: self.renderer_unavailable.load(Ordering::Relaxed),
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            total_output_bytes: self.total_output_bytes.load(Ordering::Relaxed),
            duration_p50_ms: p50.map(as_millis),
            duration_p95_ms: p95.map(as_millis),
            duration_p99_ms: p99.map(as_millis),
            sample_count: durations.len() as u64,
        }
    }
}

impl Default for RenderMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn percentiles(durations: &[Duration]) -> (Option<Duration>, Option<Duration>, Option<Duration>) {
    if durations.is_empty() {
        return (None, None, None);
    }

    let mut sorted = durations.to_vec();
    sorted.sort();
    let len = sorted.len();

    (
        sorted.get(len * 50 / 100).copied(),
        sorted.get(len * 95 / 100).copied(),
        sorted.get(len.saturating_sub(1) * 99 / 100).copied(),
    )
}

fn as_millis(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// A point-in-time snapshot of render metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Renderer processes spawned (or attempted).
    pub renders_started: u64,
    /// Artifacts delivered.
    pub renders_succeeded: u64,
    /// Started renders that delivered nothing.
    pub renders_failed: u64,
    /// Failures caused by the timeout.
    pub renders_timed_out: u64,
    /// Failures caused by a renderer that could not be started.
    pub renderer_unavailable: u64,
    /// Requests rejected by validation.
    pub validation_rejections: u64,
    /// Sum of delivered artifact sizes.
    pub total_output_bytes: u64,
    /// Median successful render duration.
    pub duration_p50_ms: Option<u64>,
    /// 95th percentile successful render duration.
    pub duration_p95_ms: Option<u64>,
    /// 99th percentile successful render duration.
    pub duration_p99_ms: Option<u64>,
    /// Number of duration samples held.
    pub sample_count: u64,
}
