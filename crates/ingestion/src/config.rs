//! Backpressure configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

/// What to do with an event when the fan-in channel is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Discard the incoming event
    #[default]
    DropNewest,
    /// Evict the oldest queued event to make room
    DropOldest,
}

/// Backpressure configuration
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Channel capacity
    pub channel_capacity: usize,

    /// Drop policy when full
    pub drop_policy: DropPolicy,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            drop_policy: DropPolicy::DropNewest,
        }
    }
}

impl BackpressureConfig {
    pub fn new(channel_capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            channel_capacity,
            drop_policy,
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Events delivered by sources
    pub events_received: AtomicU64,

    /// Events lost to backpressure
    pub events_dropped: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_received(&self) {
        self.events_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub events_received: u64,
    pub events_dropped: u64,
    pub queue_len: usize,
}
