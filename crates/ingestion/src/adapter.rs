//! Sensor adapter trait

use std::sync::Arc;

use async_channel::Sender;
use contracts::{SensorEvent, StreamKind};

use crate::config::IngestionMetrics;

/// Bridges one event producer into the shared fan-in channel
///
/// Implementations register a callback with their producer, forward every
/// event to the channel and apply backpressure when it is full.
pub trait SensorAdapter: Send + Sync {
    fn source_id(&self) -> &str;

    /// Stream kinds the underlying producer emits
    fn kinds(&self) -> Vec<StreamKind>;

    /// Start forwarding events
    fn start(&self, tx: Sender<SensorEvent>, metrics: Arc<IngestionMetrics>);

    fn stop(&self);

    fn is_listening(&self) -> bool;
}
