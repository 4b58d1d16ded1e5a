//! Lock-guarded session state

use std::time::Duration;

use contracts::PosturePrediction;
use decision::SessionAggregator;
use feature_engine::SampleBuffer;
use observability::CycleStatsAggregator;
use tokio::sync::mpsc;

/// Everything one session mutates
///
/// Guarded by a single mutex: one ingestion or one full processing cycle
/// holds it at a time.
#[derive(Debug)]
pub(crate) struct SessionState {
    pub active: bool,
    pub buffer: SampleBuffer,
    pub latest: PosturePrediction,
    pub history: SessionAggregator,
    pub started_at: Duration,
    /// Prediction consumer; `None` once stopped
    pub sink: Option<mpsc::Sender<PosturePrediction>>,
    pub stats: CycleStatsAggregator,
    /// Ring overflow already reported to metrics
    pub reported_dropped: u64,
}

impl SessionState {
    pub fn new(buffer: SampleBuffer) -> Self {
        Self {
            active: false,
            buffer,
            latest: PosturePrediction::collecting(),
            history: SessionAggregator::new(),
            started_at: Duration::ZERO,
            sink: None,
            stats: CycleStatsAggregator::new(),
            reported_dropped: 0,
        }
    }

    /// Fresh session state, starting at `now`
    pub fn begin(&mut self, now: Duration, sink: mpsc::Sender<PosturePrediction>) {
        self.reset();
        self.active = true;
        self.started_at = now;
        self.sink = Some(sink);
        self.stats.reset();
    }

    /// Drop buffers, history and the consumer
    pub fn reset(&mut self) {
        self.active = false;
        self.buffer.clear();
        self.history.clear();
        self.latest = PosturePrediction::collecting();
        self.sink = None;
        self.reported_dropped = 0;
    }
}
