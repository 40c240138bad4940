//! Tracing setup and in-process counters

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter when set.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // A subscriber may already be installed (e.g. by a test harness).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Counters for resolution and command execution
#[derive(Debug, Default)]
pub struct Metrics {
    factory_hits: AtomicU64,
    fallback_hits: AtomicU64,
    resolution_failures: AtomicU64,
    commands_executed: AtomicU64,
    commands_failed: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory_hit(&self) {
        self.factory_hits.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(counter = "factory_hits", "Metric incremented");
    }

    pub fn fallback_hit(&self) {
        self.fallback_hits.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "fallback_hits", "Metric incremented");
    }

    pub fn resolution_failed(&self) {
        self.resolution_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "resolution_failures", "Metric incremented");
    }

    pub fn command_executed(&self) {
        self.commands_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn command_failed(&self) {
        self.commands_failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "commands_failed", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            factory_hits: self.factory_hits.load(Ordering::Relaxed),
            fallback_hits: self.fallback_hits.load(Ordering::Relaxed),
            resolution_failures: self.resolution_failures.load(Ordering::Relaxed),
            commands_executed: self.commands_executed.load(Ordering::Relaxed),
            commands_failed: self.commands_failed.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub factory_hits: u64,
    pub fallback_hits: u64,
    pub resolution_failures: u64,
    pub commands_executed: u64,
    pub commands_failed: u64,
}
