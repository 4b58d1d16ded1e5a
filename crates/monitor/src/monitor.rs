//! Session orchestrator.
//!
//! Wires the feature pipeline, the classifier and the decision stages to a
//! cancellable periodic task. All session state sits behind one mutex, so a
//! cycle either runs completely before `stop` or observes the stopped
//! session and emits nothing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use contracts::{
    Classifier, Clock, ContractError, FeatureConfig, PosturePrediction, SensorEvent, SessionResult,
};
use decision::{classify_and_decide, DecisionPolicy};
use feature_engine::{BufferStats, FeaturePipeline, RecordOutcome, SampleBuffer};
use observability::{
    record_buffer_depth, record_cycle, record_prediction, record_prediction_dropped,
    record_sample_recorded, record_samples_dropped, CycleOutcome, CycleSummary,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, trace, warn};

use crate::settings::MonitorSettings;
use crate::state::SessionState;

/// Shared by the monitor handle and its background tasks
struct MonitorCore {
    pipeline: FeaturePipeline,
    policy: DecisionPolicy,
    classifier: Arc<dyn Classifier>,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    state: Mutex<SessionState>,
    /// `true` while no session is running
    cancel: watch::Sender<bool>,
}

impl MonitorCore {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: SensorEvent) -> bool {
        let mut state = self.lock();
        if !state.active {
            trace!(kind = %event.kind, "event ignored, no active session");
            return false;
        }
        let kind = event.kind;
        match state.buffer.record(kind, event.timestamp_ns, event.values) {
            RecordOutcome::Stored => {
                record_sample_recorded(kind.key());
                true
            }
            RecordOutcome::Discarded => {
                record_samples_dropped(1);
                trace!(kind = %kind, ts = event.timestamp_ns, "event precedes session origin");
                false
            }
        }
    }

    fn run_cycle(&self) -> CycleOutcome {
        let started = Instant::now();
        let mut state = self.lock();
        if !state.active {
            record_cycle(CycleOutcome::Inactive, 0.0);
            return CycleOutcome::Inactive;
        }

        self.report_buffer(&mut state);
        let snapshot = state.buffer.snapshot();

        let outcome = match self.pipeline.build(&snapshot) {
            None => CycleOutcome::InsufficientData,
            Some(vector) => {
                match classify_and_decide(self.classifier.as_ref(), &self.policy, &vector.values) {
                    Ok(prediction) => {
                        debug!(
                            label = %prediction.label,
                            confidence = prediction.confidence,
                            bucket_time = vector.bucket_time,
                            "prediction"
                        );
                        Self::accept(&mut state, prediction);
                        CycleOutcome::Predicted
                    }
                    Err(e) => {
                        warn!(
                            classifier = self.classifier.name(),
                            error = %e,
                            retained = %state.latest.label,
                            "classifier cycle failed"
                        );
                        CycleOutcome::ClassifierFailed
                    }
                }
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        state.stats.update(outcome, latency_ms);
        record_cycle(outcome, latency_ms);
        outcome
    }

    fn accept(state: &mut SessionState, prediction: PosturePrediction) {
        state.history.record(&prediction);
        state.stats.update_prediction(&prediction);
        record_prediction(&prediction);
        state.latest = prediction.clone();

        let closed = match state.sink.as_ref().map(|sink| sink.try_send(prediction)) {
            None | Some(Ok(())) => false,
            Some(Err(TrySendError::Full(dropped))) => {
                warn!(label = %dropped.label, "prediction consumer is full, dropping prediction");
                record_prediction_dropped();
                false
            }
            Some(Err(TrySendError::Closed(_))) => true,
        };
        if closed {
            debug!("prediction consumer closed");
            state.sink = None;
        }
    }

    fn report_buffer(&self, state: &mut SessionState) {
        let stats = state.buffer.stats();
        for stream in &stats.streams {
            record_buffer_depth(stream.kind.key(), stream.depth);
        }
        let dropped = stats.total_dropped();
        record_samples_dropped(dropped.saturating_sub(state.reported_dropped));
        state.reported_dropped = dropped;
    }
}

/// Live posture session monitor
///
/// Dependencies are constructor parameters; there is no global state.
///
/// # Example
///
/// ```ignore
/// let monitor = PostureMonitor::new(config, classifier, Arc::new(SystemClock::new()), MonitorSettings::default())?;
/// let mut predictions = monitor.start()?;
/// monitor.attach(ingestion_rx);
/// while let Some(prediction) = predictions.recv().await { /* render */ }
/// let summary = monitor.stop()?;
/// ```
pub struct PostureMonitor {
    core: Arc<MonitorCore>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl PostureMonitor {
    /// # Errors
    /// `ConfigValidation` when the feature pipeline cannot be built.
    pub fn new(
        config: Arc<FeatureConfig>,
        classifier: Arc<dyn Classifier>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
    ) -> Result<Self, ContractError> {
        let pipeline = FeaturePipeline::new(config.clone())?;
        let (cancel, _) = watch::channel(true);
        let core = MonitorCore {
            policy: DecisionPolicy::new(config.class_labels.clone()),
            state: Mutex::new(SessionState::new(SampleBuffer::from_config(&config))),
            pipeline,
            classifier,
            clock,
            settings,
            cancel,
        };
        Ok(Self {
            core: Arc::new(core),
            task: Mutex::new(None),
        })
    }

    /// Begin a session and spawn the periodic cycle task
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// `SessionState` when a session is already running.
    #[instrument(name = "monitor_start", skip(self), fields(period_ms = self.core.settings.period.as_millis() as u64))]
    pub fn start(&self) -> Result<mpsc::Receiver<PosturePrediction>, ContractError> {
        let mut state = self.core.lock();
        if state.active {
            return Err(ContractError::session_state("session already active"));
        }

        let (tx, rx) = mpsc::channel(self.core.settings.channel_capacity.max(1));
        state.begin(self.core.clock.now(), tx);
        self.core.cancel.send_replace(false);

        let handle = tokio::spawn(cycle_loop(self.core.clone(), self.core.cancel.subscribe()));
        if let Some(stale) = self.lock_task().replace(handle) {
            stale.abort();
        }
        drop(state);

        info!(classifier = self.core.classifier.name(), "session started");
        Ok(rx)
    }

    /// Buffer one sensor reading
    ///
    /// Returns `false` when no session is active or the reading precedes the
    /// session origin.
    pub fn record(&self, event: SensorEvent) -> bool {
        self.core.record(event)
    }

    /// Run one processing cycle immediately
    pub fn run_cycle(&self) -> CycleOutcome {
        self.core.run_cycle()
    }

    /// End the session and summarize it
    ///
    /// Cancels the cycle task and clears every buffer under the session
    /// lock; nothing is delivered afterwards.
    ///
    /// # Errors
    /// `SessionState` when no session is running.
    #[instrument(name = "monitor_stop", skip(self))]
    pub fn stop(&self) -> Result<SessionResult, ContractError> {
        let mut state = self.core.lock();
        if !state.active {
            return Err(ContractError::session_state("no active session"));
        }

        let elapsed = self.core.clock.now().saturating_sub(state.started_at);
        let result = state.history.summarize(elapsed.as_secs());
        let cycles = state.stats.total_cycles();
        state.reset();

        self.core.cancel.send_replace(true);
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
        drop(state);

        info!(
            total_duration = result.total_duration,
            labels = result.breakdown.len(),
            cycles,
            "session stopped"
        );
        Ok(result)
    }

    /// Forward events from an ingestion channel until it closes or the
    /// session stops
    ///
    /// Resolves to the number of events stored.
    pub fn attach(&self, rx: async_channel::Receiver<SensorEvent>) -> JoinHandle<u64> {
        let core = self.core.clone();
        let mut cancel = self.core.cancel.subscribe();
        tokio::spawn(async move {
            let mut stored = 0u64;
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Ok(event) => {
                            if core.record(event) {
                                stored += 1;
                            }
                        }
                        Err(_) => break,
                    },
                    changed = cancel.changed() => {
                        if changed.is_err() || *cancel.borrow_and_update() {
                            break;
                        }
                    }
                }
            }
            debug!(stored, "ingestion forwarding finished");
            stored
        })
    }

    /// Most recent prediction (`collecting` until the first one)
    pub fn latest(&self) -> PosturePrediction {
        self.core.lock().latest.clone()
    }

    pub fn is_active(&self) -> bool {
        self.core.lock().active
    }

    /// Predictions recorded in the current session's history
    pub fn history_len(&self) -> usize {
        self.core.lock().history.len()
    }

    pub fn buffer_stats(&self) -> BufferStats {
        self.core.lock().buffer.stats()
    }

    /// Cycle outcomes of the current or most recent session
    pub fn cycle_summary(&self) -> CycleSummary {
        self.core.lock().stats.summary()
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.core.pipeline
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.core.settings
    }

    fn lock_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PostureMonitor {
    fn drop(&mut self) {
        self.core.cancel.send_replace(true);
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }
}

async fn cycle_loop(core: Arc<MonitorCore>, mut cancel: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(core.settings.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if core.run_cycle() == CycleOutcome::Inactive {
                    break;
                }
            }
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow_and_update() {
                    break;
                }
            }
        }
    }
    debug!("cycle task finished");
}
