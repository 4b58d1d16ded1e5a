//! SensorSource trait - Sensor data source abstraction
//!
//! Defines a unified interface for telemetry sources, decoupling the
//! ingestion layer from concrete sensor drivers. Device sensors, synthetic
//! generators and recording replays all implement it.

use std::sync::Arc;

use crate::{SensorEvent, StreamKind};

/// Sensor event callback type
///
/// When a source produces a reading, it sends a `SensorEvent` through this
/// callback. Uses `Arc` so the callback can be shared across threads.
pub type SensorEventCallback = Arc<dyn Fn(SensorEvent) + Send + Sync>;

/// Sensor data source trait
///
/// Sources deliver events asynchronously, on their own thread or task, at
/// whatever rate the device provides. Consumers must tolerate jitter, gaps
/// and out-of-order timestamps.
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn SensorSource> = open_device_sensors();
/// source.listen(Arc::new(|event| {
///     println!("{} @ {}", event.kind, event.timestamp_ns);
/// }));
/// // ... session runs ...
/// source.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Source identifier (for logs and metrics)
    fn source_id(&self) -> &str;

    /// Stream kinds this source emits
    fn kinds(&self) -> Vec<StreamKind>;

    /// Register the event callback and start delivering
    ///
    /// Repeated calls while already listening are idempotent.
    fn listen(&self, callback: SensorEventCallback);

    /// Stop delivering events
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
