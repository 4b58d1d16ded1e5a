//! Session statistics and report.

use std::time::Duration;

use contracts::SessionResult;
use feature_engine::BufferStats;
use ingestion::MetricsSnapshot;
use observability::CycleSummary;
use serde::Serialize;

/// Statistics from one session run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    /// Telemetry source description
    pub source: String,

    /// Time-weighted posture breakdown
    pub result: SessionResult,

    /// Predictions received from the monitor
    pub predictions_received: u64,

    /// Events stored in the session buffer
    pub events_stored: u64,

    /// Fan-in channel counters
    pub ingestion: MetricsSnapshot,

    /// Buffer state just before stop
    pub buffer: BufferStats,

    /// Cycle outcomes
    pub cycles: CycleSummary,

    /// Wall-clock run time
    #[serde(serialize_with = "seconds")]
    pub duration: Duration,
}

fn seconds<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

impl SessionStats {
    /// Predictions per minute of run time
    pub fn predictions_per_minute(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.predictions_received as f64 * 60.0 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Session Summary                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Source: {}", self.source);
        println!("   ├─ Run time: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Session duration: {}s", self.result.total_duration);
        println!("   ├─ Predictions: {}", self.predictions_received);
        println!("   ├─ Predictions/min: {:.2}", self.predictions_per_minute());
        println!("   └─ Events stored: {}", self.events_stored);

        println!("\n🧍 Posture Breakdown");
        if self.result.breakdown.is_empty() {
            println!("   └─ (no classified cycles)");
        }
        for (i, entry) in self.result.breakdown.iter().enumerate() {
            let prefix = if i + 1 == self.result.breakdown.len() { "└─" } else { "├─" };
            println!(
                "   {} {}: {}s ({:.1}%)",
                prefix, entry.label, entry.duration_seconds, entry.percentage
            );
        }

        println!("\n📈 Pipeline");
        println!("   ├─ Events received: {}", self.ingestion.events_received);
        println!("   ├─ Events dropped (channel): {}", self.ingestion.events_dropped);
        println!("   ├─ Samples dropped (buffer): {}", self.buffer.total_dropped());
        println!("   └─ Samples before origin: {}", self.buffer.discarded);

        println!("\n{}", self.cycles);
    }
}
