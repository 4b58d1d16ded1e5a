//! # Feature Engine
//!
//! Streaming reproduction of the offline feature-engineering pipeline.
//!
//! Stages, leaf-first:
//! - `SampleBuffer`: per-stream bounded history, shared session time origin
//! - `BucketAggregator`: trim, fixed-width buckets, magnitude derivation
//! - `Scaler`: min-max normalization against the trained range table
//! - orientation: rotation vector → yaw/pitch/roll
//! - `MotionPcaProjector`: joins motion streams and projects onto the PCA basis
//! - `RollingStatsComputer`: sliding-window mean/std per feature group
//! - `StreamSynchronizer`: common-bucket alignment, ordered vector assembly
//!
//! `FeaturePipeline` wires them together. Insufficient data is never an
//! error: every stage returns an empty result and the pipeline returns `None`.
//!
//! ## Example
//!
//! ```ignore
//! use feature_engine::{FeaturePipeline, SampleBuffer};
//!
//! let pipeline = FeaturePipeline::new(config.clone())?;
//! let mut buffer = SampleBuffer::from_config(&config);
//!
//! buffer.record(event.kind, event.timestamp_ns, event.values);
//! if let Some(vector) = pipeline.build(&buffer.snapshot()) {
//!     classifier.classify(&vector.values)?;
//! }
//! ```

mod bucket;
mod buffer;
mod engine;
pub mod orientation;
mod pca;
mod rolling;
mod scaler;
mod synchronizer;

pub use bucket::BucketAggregator;
pub use buffer::{BufferSnapshot, BufferStats, RecordOutcome, SampleBuffer, StreamBufferStats};
pub use engine::{FeaturePipeline, PipelineTrace};
pub use orientation::Orientation;
pub use pca::MotionPcaProjector;
pub use rolling::{mean_std, RollingStatsComputer};
pub use scaler::{scale_value, Scaler};
pub use synchronizer::StreamSynchronizer;

// Re-export contracts types
pub use contracts::{Bucket, BucketKey, BucketedSeries, FeatureVector, RollingFeatureMap};
