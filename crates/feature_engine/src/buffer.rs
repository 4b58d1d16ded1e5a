//! Per-stream sample history with a shared session time origin.
//!
//! Each stream owns a fixed-capacity `HeapRb`. Iteration is always
//! time-ascending: in-order samples are appended, late samples are spliced
//! into place. Retention is keyed on each stream's own latest sample, never
//! on wall-clock time.

use std::collections::HashMap;
use std::fmt;

use contracts::{FeatureConfig, SampleValues, SensorSample, StreamKind};
use ringbuf::{traits::*, HeapRb};
use serde::Serialize;

const NANOS_PER_SECOND: f64 = 1e9;

/// Result of recording one reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Stored in the stream's history
    Stored,
    /// Timestamp precedes the session origin
    Discarded,
}

/// Ring buffer for one stream
struct StreamBuffer {
    ring: HeapRb<SensorSample>,
    capacity: usize,
    latest: Option<f64>,
    dropped: u64,
    out_of_order: u64,
    pruned: u64,
}

impl StreamBuffer {
    fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity),
            capacity,
            latest: None,
            dropped: 0,
            out_of_order: 0,
            pruned: 0,
        }
    }

    fn push(&mut self, sample: SensorSample, retention: f64) {
        let timestamp = sample.timestamp;
        let in_order = self.latest.is_none_or(|latest| timestamp >= latest);

        if in_order {
            // Full: overwrite the oldest sample
            if self.ring.is_full() {
                let _ = self.ring.try_pop();
                self.dropped += 1;
            }
            let _ = self.ring.try_push(sample);
            self.latest = Some(timestamp);
        } else {
            self.out_of_order += 1;
            if self.ring.is_full() {
                // A full ring keeps the newest samples: a late reading older
                // than everything held is the one to lose
                let oldest = self.ring.iter().next().map(|s| s.timestamp);
                if oldest.is_some_and(|oldest| timestamp < oldest) {
                    self.dropped += 1;
                    return;
                }
                let _ = self.ring.try_pop();
                self.dropped += 1;
            }
            let mut samples: Vec<SensorSample> = self.ring.pop_iter().collect();
            let position = samples.partition_point(|s| s.timestamp <= timestamp);
            samples.insert(position, sample);
            for s in samples {
                let _ = self.ring.try_push(s);
            }
        }

        self.prune(retention);
    }

    /// Drop samples more than `retention` seconds behind the latest one
    fn prune(&mut self, retention: f64) {
        let Some(latest) = self.latest else {
            return;
        };
        let cutoff = latest - retention;
        while self
            .ring
            .iter()
            .next()
            .is_some_and(|oldest| oldest.timestamp < cutoff)
        {
            let _ = self.ring.try_pop();
            self.pruned += 1;
        }
    }

    fn samples(&self) -> Vec<SensorSample> {
        self.ring.iter().cloned().collect()
    }

    fn len(&self) -> usize {
        self.ring.occupied_len()
    }
}

/// Per-stream bounded sample history
pub struct SampleBuffer {
    streams: HashMap<StreamKind, StreamBuffer>,
    origin_ns: Option<i64>,
    retention_seconds: f64,
    capacity: usize,
    discarded: u64,
}

impl fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("streams", &self.streams.len())
            .field("origin_ns", &self.origin_ns)
            .field("retention_seconds", &self.retention_seconds)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl SampleBuffer {
    /// Create an empty buffer
    ///
    /// `capacity` is clamped to at least one sample per stream.
    pub fn new(retention_seconds: f64, capacity: usize) -> Self {
        Self {
            streams: HashMap::new(),
            origin_ns: None,
            retention_seconds,
            capacity: capacity.max(1),
            discarded: 0,
        }
    }

    /// Buffer sized from the feature configuration
    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(config.retention_seconds, config.max_samples_per_stream)
    }

    /// Record one reading
    ///
    /// The first reading of a session fixes the time origin for every
    /// stream. Readings before the origin are discarded.
    pub fn record(&mut self, kind: StreamKind, timestamp_ns: i64, values: SampleValues) -> RecordOutcome {
        let origin = *self.origin_ns.get_or_insert(timestamp_ns);
        let relative = timestamp_ns.saturating_sub(origin) as f64 / NANOS_PER_SECOND;
        if relative < 0.0 {
            self.discarded += 1;
            return RecordOutcome::Discarded;
        }

        let capacity = self.capacity;
        self.streams
            .entry(kind)
            .or_insert_with(|| StreamBuffer::new(capacity))
            .push(SensorSample::new(relative, values), self.retention_seconds);
        RecordOutcome::Stored
    }

    /// Reset every stream and the time origin
    pub fn clear(&mut self) {
        self.streams.clear();
        self.origin_ns = None;
        self.discarded = 0;
    }

    /// Owned, time-ascending copy of every stream
    pub fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot {
            streams: self
                .streams
                .iter()
                .map(|(kind, buffer)| (*kind, buffer.samples()))
                .collect(),
        }
    }

    /// Session time origin (sensor nanoseconds), if any sample was recorded
    pub fn origin_ns(&self) -> Option<i64> {
        self.origin_ns
    }

    /// Number of samples held for a stream
    pub fn len(&self, kind: StreamKind) -> usize {
        self.streams.get(&kind).map_or(0, StreamBuffer::len)
    }

    /// Whether no stream holds any sample
    pub fn is_empty(&self) -> bool {
        self.streams.values().all(|s| s.len() == 0)
    }

    /// Depth and loss counters, in canonical stream order
    pub fn stats(&self) -> BufferStats {
        let streams = StreamKind::ALL
            .into_iter()
            .filter_map(|kind| {
                self.streams.get(&kind).map(|buffer| StreamBufferStats {
                    kind,
                    depth: buffer.len(),
                    capacity: buffer.capacity,
                    latest_timestamp: buffer.latest,
                    dropped: buffer.dropped,
                    out_of_order: buffer.out_of_order,
                    pruned: buffer.pruned,
                })
            })
            .collect();
        BufferStats {
            streams,
            discarded: self.discarded,
        }
    }
}

/// Owned samples handed to one processing cycle
#[derive(Debug, Clone, Default)]
pub struct BufferSnapshot {
    streams: HashMap<StreamKind, Vec<SensorSample>>,
}

impl BufferSnapshot {
    /// Build a snapshot from already-ordered samples
    pub fn from_streams(streams: HashMap<StreamKind, Vec<SensorSample>>) -> Self {
        Self { streams }
    }

    /// Samples of one stream (empty when never recorded)
    pub fn samples(&self, kind: StreamKind) -> &[SensorSample] {
        self.streams.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_samples(&self) -> usize {
        self.streams.values().map(Vec::len).sum()
    }
}

/// Counters for one stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamBufferStats {
    pub kind: StreamKind,
    pub depth: usize,
    pub capacity: usize,
    pub latest_timestamp: Option<f64>,
    /// Overwritten because the ring was full
    pub dropped: u64,
    /// Arrived behind the stream's latest sample
    pub out_of_order: u64,
    /// Evicted by the retention window
    pub pruned: u64,
}

/// Counters for the whole buffer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BufferStats {
    pub streams: Vec<StreamBufferStats>,
    /// Readings that preceded the session origin
    pub discarded: u64,
}

impl BufferStats {
    pub fn total_dropped(&self) -> u64 {
        self.streams.iter().map(|s| s.dropped).sum()
    }
}
