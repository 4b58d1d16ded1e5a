//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace: the
//! telemetry data model, the feature configuration bundle, and the traits for
//! the external collaborators (sensor sources, the classifier, the clock).
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Sensors report monotonic timestamps in nanoseconds (`i64`)
//! - The first sample of a session becomes the time origin; everything
//!   downstream works in seconds relative to that origin (`f64`)
//! - Bucket identity is the integer [`BucketKey`], never a float comparison

mod classifier;
mod clock;
mod error;
mod feature_config;
mod prediction;
mod sample;
mod sensor_source;
mod series;

pub use classifier::Classifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::*;
pub use feature_config::*;
pub use prediction::*;
pub use sample::*;
pub use sensor_source::{SensorEventCallback, SensorSource};
pub use series::*;
