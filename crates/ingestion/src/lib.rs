//! # Ingestion Pipeline
//!
//! Sensor event ingestion.
//!
//! Responsibilities:
//! - Register event sources (device drivers, synthetic generator, replay)
//! - Backpressure management and drop policy
//! - Fan events into one bounded async-channel for the session monitor
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, SyntheticConfig, SyntheticPostureSource};
//!
//! let mut pipeline = IngestionPipeline::new(1024);
//! let source = SyntheticPostureSource::new("synthetic", SyntheticConfig::default());
//! pipeline.register_source("synthetic".into(), Box::new(source), None)?;
//!
//! let rx = pipeline.take_receiver().unwrap();
//! pipeline.start_all();
//! while let Ok(event) = rx.recv().await {
//!     monitor.record(event);
//! }
//! ```

mod adapter;
mod config;
mod error;
mod generic_adapter;
mod pipeline;
mod replay;
mod send;
mod synthetic;

pub use adapter::SensorAdapter;
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use contracts::SensorEvent;
pub use error::{IngestionError, Result};
pub use generic_adapter::GenericSensorAdapter;
pub use pipeline::IngestionPipeline;
pub use replay::{write_recording, JsonlReplaySource, ReplayConfig};
pub use synthetic::{SyntheticConfig, SyntheticGenerator, SyntheticPostureSource, POSTURE_PRESETS};
