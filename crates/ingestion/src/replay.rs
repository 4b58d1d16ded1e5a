//! JSONL recording replay
//!
//! A recording holds one `SensorEvent` per line:
//!
//! ```text
//! {"kind":"accelerometer","timestamp_ns":1000000000,"values":{"x":0.1,"y":0.0,"z":9.8}}
//! ```
//!
//! Events are replayed in timestamp order, paced by their recorded spacing
//! divided by the speed multiplier.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{SensorEvent, SensorEventCallback, SensorSource, StreamKind};
use tracing::{debug, info, warn};

use crate::error::{IngestionError, Result};

/// Replay configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Playback speed; `f64::INFINITY` replays without pacing
    pub speed_multiplier: f64,
    /// Restart from the beginning when the recording ends
    pub loop_playback: bool,
    /// Skip undecodable lines instead of failing the load
    pub skip_invalid: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            loop_playback: false,
            skip_invalid: false,
        }
    }
}

/// Replays a recorded session as a `SensorSource`
pub struct JsonlReplaySource {
    source_id: String,
    events: Arc<Vec<SensorEvent>>,
    config: ReplayConfig,
    listening: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl JsonlReplaySource {
    /// Load a recording
    ///
    /// # Errors
    /// `Io` when the file cannot be read, `ParseFailed` for the first bad
    /// line unless `skip_invalid` is set.
    pub fn load(path: &Path, source_id: impl Into<String>, config: ReplayConfig) -> Result<Self> {
        let shown = path.display().to_string();
        let io_err = |source| IngestionError::Io {
            path: shown.clone(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);

        let mut events = Vec::new();
        let mut skipped = 0usize;
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SensorEvent>(&line) {
                Ok(event) => events.push(event),
                Err(e) if config.skip_invalid => {
                    skipped += 1;
                    warn!(path = %shown, line = index + 1, error = %e, "skipping invalid replay line");
                }
                Err(e) => {
                    return Err(IngestionError::ParseFailed {
                        path: shown,
                        line: index + 1,
                        message: e.to_string(),
                    })
                }
            }
        }

        let source = Self::from_events(source_id, events, config);
        info!(
            source_id = %source.source_id,
            events = source.events.len(),
            skipped,
            span_ms = source.span().as_millis() as u64,
            "loaded replay recording"
        );
        Ok(source)
    }

    /// Replay events already in memory
    pub fn from_events(source_id: impl Into<String>, mut events: Vec<SensorEvent>, config: ReplayConfig) -> Self {
        // Stable: equal timestamps keep file order
        events.sort_by_key(|e| e.timestamp_ns);
        Self {
            source_id: source_id.into(),
            events: Arc::new(events),
            config,
            listening: Arc::new(AtomicBool::new(false)),
            finished: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    pub fn events(&self) -> &[SensorEvent] {
        &self.events
    }

    /// Time between the first and last recorded event
    pub fn span(&self) -> Duration {
        match (self.events.first(), self.events.last()) {
            (Some(first), Some(last)) => {
                Duration::from_nanos(last.timestamp_ns.saturating_sub(first.timestamp_ns).max(0) as u64)
            }
            _ => Duration::ZERO,
        }
    }

    /// Whether a non-looping replay has delivered every event
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl SensorSource for JsonlReplaySource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kinds(&self) -> Vec<StreamKind> {
        StreamKind::ALL
            .into_iter()
            .filter(|kind| self.events.iter().any(|e| e.kind == *kind))
            .collect()
    }

    fn listen(&self, callback: SensorEventCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        self.finished.store(false, Ordering::SeqCst);

        let listening = self.listening.clone();
        let finished = self.finished.clone();
        let source_id = self.source_id.clone();
        let events = self.events.clone();
        let speed = self.config.speed_multiplier.max(0.1);
        let loop_playback = self.config.loop_playback;
        // Later loops are shifted past the previous one to stay monotonic
        let loop_stride = self.span().as_nanos() as i64 + 1;

        let handle = thread::spawn(move || {
            debug!(source_id = %source_id, "replay thread started");
            let Some(first_timestamp) = events.first().map(|e| e.timestamp_ns) else {
                warn!(source_id = %source_id, "no events to replay");
                finished.store(true, Ordering::SeqCst);
                listening.store(false, Ordering::SeqCst);
                return;
            };

            let mut pass = 0i64;
            loop {
                let start_time = Instant::now();
                for event in events.iter() {
                    if !listening.load(Ordering::Relaxed) {
                        debug!(source_id = %source_id, "replay stopped");
                        return;
                    }

                    let offset = (event.timestamp_ns - first_timestamp) as f64 / 1e9;
                    let target_elapsed = Duration::from_secs_f64(offset / speed);
                    let actual_elapsed = start_time.elapsed();
                    if target_elapsed > actual_elapsed {
                        thread::sleep(target_elapsed - actual_elapsed);
                    }

                    let mut event = event.clone();
                    event.timestamp_ns += pass * loop_stride;
                    callback(event);
                }

                if !loop_playback {
                    info!(source_id = %source_id, "replay completed");
                    break;
                }
                pass += 1;
                debug!(source_id = %source_id, pass, "looping replay");
            }

            finished.store(true, Ordering::SeqCst);
            listening.store(false, Ordering::SeqCst);
        });

        *self.thread_handle.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        let handle = self
            .thread_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

/// Write events as a JSONL recording
pub fn write_recording<'a>(path: &Path, events: impl IntoIterator<Item = &'a SensorEvent>) -> Result<()> {
    let io_err = |source| IngestionError::Io {
        path: path.display().to_string(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    for event in events {
        let line = serde_json::to_string(event).map_err(|e| IngestionError::ParseFailed {
            path: path.display().to_string(),
            line: 0,
            message: e.to_string(),
        })?;
        writeln!(writer, "{line}").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn event(kind: StreamKind, ts: i64) -> SensorEvent {
        SensorEvent::from_axes(kind, ts, [("x", 0.0), ("y", 0.0), ("z", 1.0)])
    }

    fn unpaced() -> ReplayConfig {
        ReplayConfig {
            speed_multiplier: f64::INFINITY,
            ..ReplayConfig::default()
        }
    }

    fn collect(source: &JsonlReplaySource) -> Vec<SensorEvent> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        source.listen(Arc::new(move |event| sink.lock().unwrap().push(event)));
        for _ in 0..200 {
            if source.is_finished() {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        source.stop();
        let events = seen.lock().unwrap().clone();
        events
    }

    #[test]
    fn test_load_sorts_and_replays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        let recorded = vec![
            event(StreamKind::Gyroscope, 300),
            event(StreamKind::Accelerometer, 100),
            event(StreamKind::RotationVector, 200),
        ];
        write_recording(&path, &recorded).unwrap();

        let source = JsonlReplaySource::load(&path, "replay", unpaced()).unwrap();
        assert_eq!(source.events().len(), 3);
        assert_eq!(
            source.kinds(),
            vec![StreamKind::Accelerometer, StreamKind::Gyroscope, StreamKind::RotationVector]
        );
        assert_eq!(source.span(), Duration::from_nanos(200));

        let replayed: Vec<i64> = collect(&source).iter().map(|e| e.timestamp_ns).collect();
        assert_eq!(replayed, vec![100, 200, 300]);
        assert!(source.is_finished());
    }

    #[test]
    fn test_invalid_line_fails_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, "{\"kind\":\"gravity\",\"timestamp_ns\":1,\"values\":{}}\nnot json\n").unwrap();

        let err = JsonlReplaySource::load(&path, "replay", ReplayConfig::default()).err().unwrap();
        let expected_path = path.display().to_string();
        assert!(
            matches!(&err, IngestionError::ParseFailed { line: 2, path, .. } if *path == expected_path),
            "{err}"
        );

        let lenient = ReplayConfig {
            skip_invalid: true,
            ..ReplayConfig::default()
        };
        let source = JsonlReplaySource::load(&path, "replay", lenient).unwrap();
        assert_eq!(source.events().len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let err = JsonlReplaySource::load(Path::new("/nonexistent/rec.jsonl"), "r", ReplayConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, IngestionError::Io { .. }));
    }

    #[test]
    fn test_loop_shifts_timestamps() {
        let source = JsonlReplaySource::from_events(
            "loop",
            vec![event(StreamKind::Gravity, 0), event(StreamKind::Gravity, 10)],
            ReplayConfig {
                loop_playback: true,
                ..unpaced()
            },
        );
        let count = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(Mutex::new(Vec::new()));
        let (c, l) = (count.clone(), last.clone());
        source.listen(Arc::new(move |event| {
            if c.fetch_add(1, Ordering::SeqCst) < 6 {
                l.lock().unwrap().push(event.timestamp_ns);
            }
        }));
        while count.load(Ordering::SeqCst) < 6 {
            thread::sleep(Duration::from_millis(1));
        }
        source.stop();

        assert_eq!(*last.lock().unwrap(), vec![0, 10, 11, 21, 22, 32]);
    }

    #[test]
    fn test_empty_recording_finishes() {
        let source = JsonlReplaySource::from_events("empty", Vec::new(), unpaced());
        assert!(collect(&source).is_empty());
        assert!(source.kinds().is_empty());
    }
}
