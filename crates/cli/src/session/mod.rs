//! Session orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Session, SessionConfig, TelemetrySource};
pub use stats::SessionStats;
