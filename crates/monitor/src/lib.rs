//! # Monitor
//!
//! Live posture session orchestration.
//!
//! [`PostureMonitor`] owns the session lock, the buffered telemetry, the
//! latest prediction and the label history. A periodic task runs one
//! processing cycle per period:
//!
//! ```text
//! snapshot → FeaturePipeline → Classifier → DecisionPolicy → SessionAggregator
//!                                                        └→ prediction channel
//! ```
//!
//! `stop` cancels the task, clears the buffers and returns the
//! [`SessionResult`](contracts::SessionResult).

mod monitor;
mod settings;
mod state;

pub use monitor::PostureMonitor;
pub use observability::CycleOutcome;
pub use settings::MonitorSettings;
