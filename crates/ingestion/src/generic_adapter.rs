//! `SensorSource` → fan-in channel bridge.
//!
//! Every producer (device callback, synthetic generator, replay) goes through
//! the same adapter. Events of a stream kind the source did not declare are
//! rejected before they reach the channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_channel::Sender;
use contracts::{SensorEvent, SensorEventCallback, SensorSource, StreamKind};
use tracing::{debug, trace, warn};

use crate::adapter::SensorAdapter;
use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::send::send_event;

/// Per-kind forwarding counters of one adapter
#[derive(Debug, Default)]
struct KindCounters {
    forwarded: [AtomicU64; 4],
    rejected: AtomicU64,
}

impl KindCounters {
    fn slot(kind: StreamKind) -> usize {
        match kind {
            StreamKind::Accelerometer => 0,
            StreamKind::Gyroscope => 1,
            StreamKind::Gravity => 2,
            StreamKind::RotationVector => 3,
        }
    }
}

/// Forwards a `SensorSource`'s callbacks into the fan-in channel
pub struct GenericSensorAdapter {
    source_id: String,
    source: Box<dyn SensorSource>,
    kinds: Vec<StreamKind>,
    config: BackpressureConfig,
    listening: Arc<AtomicBool>,
    counters: Arc<KindCounters>,
}

impl GenericSensorAdapter {
    pub fn new(source_id: String, source: Box<dyn SensorSource>, config: BackpressureConfig) -> Self {
        let kinds = source.kinds();
        Self {
            source_id,
            source,
            kinds,
            config,
            listening: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(KindCounters::default()),
        }
    }

    /// Events of `kind` handed to the channel so far, drop policy included
    pub fn forwarded(&self, kind: StreamKind) -> u64 {
        self.counters.forwarded[KindCounters::slot(kind)].load(Ordering::Relaxed)
    }

    /// Events of an undeclared kind
    pub fn rejected(&self) -> u64 {
        self.counters.rejected.load(Ordering::Relaxed)
    }
}

impl SensorAdapter for GenericSensorAdapter {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kinds(&self) -> Vec<StreamKind> {
        self.kinds.clone()
    }

    fn start(&self, tx: Sender<SensorEvent>, metrics: Arc<IngestionMetrics>) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!(source_id = %self.source_id, kinds = ?self.kinds, "adapter forwarding");

        let source_id = self.source_id.clone();
        let declared = self.kinds.clone();
        let drop_policy = self.config.drop_policy;
        let listening = self.listening.clone();
        let counters = self.counters.clone();

        let callback: SensorEventCallback = Arc::new(move |event: SensorEvent| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }
            if !declared.contains(&event.kind) {
                if counters.rejected.fetch_add(1, Ordering::Relaxed) == 0 {
                    warn!(source_id = %source_id, kind = %event.kind, "source emitted an undeclared stream kind");
                }
                return;
            }

            metrics.record_received();
            trace!(source_id = %source_id, kind = %event.kind, ts = event.timestamp_ns, "event");
            let slot = KindCounters::slot(event.kind);
            if send_event(&tx, event, &metrics, &source_id, drop_policy) {
                counters.forwarded[slot].fetch_add(1, Ordering::Relaxed);
            }
        });

        self.source.listen(callback);
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(
                source_id = %self.source_id,
                rejected = self.rejected(),
                "adapter stopped"
            );
            self.source.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DropPolicy;
    use async_channel::bounded;

    /// Replays a fixed script synchronously on every `listen`
    struct ScriptedSource {
        declared: Vec<StreamKind>,
        script: Vec<SensorEvent>,
        listening: AtomicBool,
    }

    impl ScriptedSource {
        fn new(declared: Vec<StreamKind>, script: Vec<SensorEvent>) -> Self {
            Self {
                declared,
                script,
                listening: AtomicBool::new(false),
            }
        }
    }

    impl SensorSource for ScriptedSource {
        fn source_id(&self) -> &str {
            "scripted"
        }

        fn kinds(&self) -> Vec<StreamKind> {
            self.declared.clone()
        }

        fn listen(&self, callback: SensorEventCallback) {
            self.listening.store(true, Ordering::SeqCst);
            for event in &self.script {
                callback(event.clone());
            }
        }

        fn stop(&self) {
            self.listening.store(false, Ordering::SeqCst);
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::SeqCst)
        }
    }

    fn reading(kind: StreamKind, ts: i64) -> SensorEvent {
        SensorEvent::from_axes(kind, ts, [("x", 0.0), ("y", 0.0), ("z", 0.0)])
    }

    fn motion_script() -> Vec<SensorEvent> {
        vec![
            reading(StreamKind::Accelerometer, 0),
            reading(StreamKind::Gyroscope, 0),
            reading(StreamKind::Gravity, 0),
            reading(StreamKind::Accelerometer, 100),
            // not declared by the source
            reading(StreamKind::RotationVector, 100),
        ]
    }

    fn adapter(capacity: usize) -> GenericSensorAdapter {
        GenericSensorAdapter::new(
            "scripted".to_string(),
            Box::new(ScriptedSource::new(StreamKind::MOTION.to_vec(), motion_script())),
            BackpressureConfig::new(capacity, DropPolicy::DropNewest),
        )
    }

    #[test]
    fn test_counts_per_kind_and_rejects_undeclared() {
        let adapter = adapter(16);
        let (tx, rx) = bounded(16);
        let metrics = Arc::new(IngestionMetrics::new());

        adapter.start(tx, metrics.clone());

        assert_eq!(adapter.kinds(), StreamKind::MOTION.to_vec());
        assert_eq!(adapter.forwarded(StreamKind::Accelerometer), 2);
        assert_eq!(adapter.forwarded(StreamKind::Gyroscope), 1);
        assert_eq!(adapter.forwarded(StreamKind::Gravity), 1);
        assert_eq!(adapter.forwarded(StreamKind::RotationVector), 0);
        assert_eq!(adapter.rejected(), 1);

        let kinds: Vec<StreamKind> = std::iter::from_fn(|| rx.try_recv().ok()).map(|e| e.kind).collect();
        assert_eq!(kinds.len(), 4);
        assert!(!kinds.contains(&StreamKind::RotationVector));
        assert_eq!(metrics.snapshot().events_received, 4);
    }

    #[test]
    fn test_closed_channel_forwards_nothing() {
        let adapter = adapter(4);
        let (tx, rx) = bounded(4);
        drop(rx);
        let metrics = Arc::new(IngestionMetrics::new());

        adapter.start(tx, metrics.clone());

        assert!(StreamKind::ALL.iter().all(|k| adapter.forwarded(*k) == 0));
        assert_eq!(adapter.rejected(), 1);
        assert_eq!(metrics.snapshot().events_received, 4);
    }

    #[test]
    fn test_stop_then_restart_resumes_forwarding() {
        let adapter = adapter(16);
        let (tx, rx) = bounded(16);
        let metrics = Arc::new(IngestionMetrics::new());

        adapter.start(tx.clone(), metrics.clone());
        // second start while listening is ignored
        adapter.start(tx.clone(), metrics.clone());
        assert_eq!(adapter.forwarded(StreamKind::Accelerometer), 2);

        adapter.stop();
        assert!(!adapter.is_listening());

        adapter.start(tx, metrics);
        assert!(adapter.is_listening());
        assert_eq!(adapter.forwarded(StreamKind::Accelerometer), 4);
        assert_eq!(rx.len(), 8);
    }
}
