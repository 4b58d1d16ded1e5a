//! Ingestion Pipeline main entry

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{SensorEvent, SensorSource};
use tracing::{debug, info, instrument};

use crate::adapter::SensorAdapter;
use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::error::{IngestionError, Result};
use crate::generic_adapter::GenericSensorAdapter;

/// Ingestion Pipeline
///
/// Manages the registered sources and merges their events into one bounded
/// channel.
pub struct IngestionPipeline {
    adapters: HashMap<String, Box<dyn SensorAdapter>>,
    metrics: Arc<IngestionMetrics>,
    /// Shared by all adapters
    tx: Sender<SensorEvent>,
    rx: Option<Receiver<SensorEvent>>,
    default_config: BackpressureConfig,
}

impl IngestionPipeline {
    pub fn new(channel_capacity: usize) -> Self {
        Self::with_config(BackpressureConfig {
            channel_capacity,
            ..Default::default()
        })
    }

    /// Create with custom backpressure configuration
    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity.max(1));

        Self {
            adapters: HashMap::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
            default_config: config,
        }
    }

    /// Register an event source
    ///
    /// # Errors
    /// `DuplicateSource` when the id is already taken.
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source, config),
        fields(source_id = %source_id)
    )]
    pub fn register_source(
        &mut self,
        source_id: String,
        source: Box<dyn SensorSource>,
        config: Option<BackpressureConfig>,
    ) -> Result<()> {
        if self.adapters.contains_key(&source_id) {
            return Err(IngestionError::DuplicateSource { source_id });
        }
        let adapter = GenericSensorAdapter::new(
            source_id.clone(),
            source,
            config.unwrap_or_else(|| self.default_config.clone()),
        );
        debug!(source_id = %source_id, kinds = ?adapter.kinds(), "registered sensor source");
        self.adapters.insert(source_id, Box::new(adapter));
        Ok(())
    }

    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all sensor adapters");
        for (source_id, adapter) in &self.adapters {
            if !adapter.is_listening() {
                debug!(source_id = %source_id, "starting adapter");
                adapter.start(self.tx.clone(), self.metrics.clone());
            }
        }
    }

    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all sensor adapters");
        for (source_id, adapter) in &self.adapters {
            if adapter.is_listening() {
                debug!(source_id = %source_id, "stopping adapter");
                adapter.stop();
            }
        }
    }

    /// Event stream receiver
    ///
    /// Can only be taken once; later calls return `None`.
    pub fn take_receiver(&mut self) -> Option<Receiver<SensorEvent>> {
        self.rx.take()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_source_listening(&self, source_id: &str) -> bool {
        self.adapters
            .get(source_id)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
