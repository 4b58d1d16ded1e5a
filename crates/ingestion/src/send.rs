//! Channel send with backpressure policy

use std::sync::Arc;

use async_channel::{Sender, TrySendError};
use contracts::SensorEvent;
use tracing::{trace, warn};

use crate::config::{DropPolicy, IngestionMetrics};

/// Send one event without blocking the producer
///
/// Returns `false` once the channel is closed.
#[inline]
pub fn send_event(
    tx: &Sender<SensorEvent>,
    event: SensorEvent,
    metrics: &Arc<IngestionMetrics>,
    source_id: &str,
    drop_policy: DropPolicy,
) -> bool {
    let open = match drop_policy {
        DropPolicy::DropNewest => match tx.try_send(event) {
            Ok(()) => {
                trace!(source_id = %source_id, "event sent");
                true
            }
            Err(TrySendError::Full(_)) => {
                metrics.record_dropped();
                ::metrics::counter!("posture_ingestion_dropped_total", "policy" => "drop_newest")
                    .increment(1);
                trace!(source_id = %source_id, "event dropped (newest)");
                true
            }
            Err(TrySendError::Closed(_)) => false,
        },
        DropPolicy::DropOldest => match tx.force_send(event) {
            Ok(None) => true,
            Ok(Some(_evicted)) => {
                metrics.record_dropped();
                ::metrics::counter!("posture_ingestion_dropped_total", "policy" => "drop_oldest")
                    .increment(1);
                trace!(source_id = %source_id, "event dropped (oldest)");
                true
            }
            Err(_) => false,
        },
    };

    if open {
        metrics.update_queue_len(tx.len());
    } else {
        warn!(source_id = %source_id, "channel closed");
    }
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_channel::bounded;
    use contracts::StreamKind;

    fn event(ts: i64) -> SensorEvent {
        SensorEvent::from_axes(StreamKind::Gyroscope, ts, [("x", 0.0)])
    }

    #[test]
    fn test_drop_newest_keeps_queue() {
        let (tx, rx) = bounded(2);
        let metrics = Arc::new(IngestionMetrics::new());
        for ts in 0..3 {
            assert!(send_event(&tx, event(ts), &metrics, "t", DropPolicy::DropNewest));
        }

        assert_eq!(metrics.snapshot().events_dropped, 1);
        assert_eq!(rx.try_recv().unwrap().timestamp_ns, 0);
        assert_eq!(rx.try_recv().unwrap().timestamp_ns, 1);
    }

    #[test]
    fn test_drop_oldest_evicts_head() {
        let (tx, rx) = bounded(2);
        let metrics = Arc::new(IngestionMetrics::new());
        for ts in 0..3 {
            assert!(send_event(&tx, event(ts), &metrics, "t", DropPolicy::DropOldest));
        }

        assert_eq!(metrics.snapshot().events_dropped, 1);
        assert_eq!(metrics.snapshot().queue_len, 2);
        assert_eq!(rx.try_recv().unwrap().timestamp_ns, 1);
        assert_eq!(rx.try_recv().unwrap().timestamp_ns, 2);
    }

    #[test]
    fn test_closed_channel_reported() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let metrics = Arc::new(IngestionMetrics::new());
        assert!(!send_event(&tx, event(0), &metrics, "t", DropPolicy::DropNewest));
        assert!(!send_event(&tx, event(0), &metrics, "t", DropPolicy::DropOldest));
    }
}
