//! Synthetic posture source
//!
//! Generates plausible accelerometer, gyroscope, gravity and rotation-vector
//! readings for a device held at a fixed posture, with sway, sensor noise
//! and timestamp jitter. Used for development runs and end-to-end tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use contracts::{SensorEvent, SensorEventCallback, SensorSource, StreamKind};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

const STANDARD_GRAVITY: f64 = 9.80665;

/// Monotonic clock reading of the first tick
const EPOCH_NS: i64 = 1_000_000_000;

/// Named posture presets
pub const POSTURE_PRESETS: [&str; 3] = ["straight", "slouching", "leaning_back"];

/// Synthetic source configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    /// Readings per stream per second
    pub frequency_hz: f64,
    /// Forward tilt of the device (degrees)
    pub pitch_degrees: f64,
    /// Sideways tilt of the device (degrees)
    pub roll_degrees: f64,
    /// Peak slow sway around the posture (degrees)
    pub sway_degrees: f64,
    /// Peak accelerometer / gyroscope noise
    pub noise: f64,
    /// Peak timestamp jitter as a fraction of the period
    pub jitter: f64,
    /// Fixed seed for reproducible sequences
    pub seed: Option<u64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 10.0,
            pitch_degrees: 0.0,
            roll_degrees: 0.0,
            sway_degrees: 1.5,
            noise: 0.05,
            jitter: 0.1,
            seed: None,
        }
    }
}

impl SyntheticConfig {
    /// Preset for one of [`POSTURE_PRESETS`]
    pub fn for_posture(label: &str) -> Option<Self> {
        let (pitch, roll) = match label {
            "straight" => (0.0, 0.0),
            "slouching" => (28.0, 4.0),
            "leaning_back" => (-22.0, -2.0),
            _ => return None,
        };
        Some(Self {
            pitch_degrees: pitch,
            roll_degrees: roll,
            ..Self::default()
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn period_ns(&self) -> i64 {
        (1e9 / self.frequency_hz.max(0.1)).round() as i64
    }
}

/// Deterministic event generator behind [`SyntheticPostureSource`]
#[derive(Debug)]
pub struct SyntheticGenerator {
    config: SyntheticConfig,
    rng: StdRng,
    tick: u64,
}

impl SyntheticGenerator {
    pub fn new(config: SyntheticConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { config, rng, tick: 0 }
    }

    /// Ticks generated so far
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// One reading per stream for the next tick
    pub fn next_tick(&mut self) -> Vec<SensorEvent> {
        let period = self.config.period_ns();
        let nominal = EPOCH_NS + self.tick as i64 * period;
        let phase = self.tick as f64 / self.config.frequency_hz.max(0.1);
        self.tick += 1;

        let sway = self.config.sway_degrees * (phase * 0.7).sin();
        let pitch = (self.config.pitch_degrees + sway).to_radians();
        let roll = (self.config.roll_degrees + 0.5 * sway).to_radians();

        let gravity = [
            -STANDARD_GRAVITY * pitch.sin(),
            STANDARD_GRAVITY * roll.sin() * pitch.cos(),
            STANDARD_GRAVITY * roll.cos() * pitch.cos(),
        ];
        let noise = self.config.noise;
        let accel = gravity.map(|g| g + self.noise(noise));
        let gyro = [self.noise(noise), self.noise(noise), self.noise(noise)];

        // Z-Y-X Euler with zero yaw
        let (sp, cp) = (pitch / 2.0).sin_cos();
        let (sr, cr) = (roll / 2.0).sin_cos();
        let quaternion = [("x", sr * cp), ("y", cr * sp), ("z", -sr * sp), ("w", cr * cp)];

        let jitter = (self.config.jitter.max(0.0) * period as f64) as i64;
        let stamp = |rng: &mut StdRng| {
            if jitter > 0 {
                nominal + rng.random_range(-jitter..=jitter)
            } else {
                nominal
            }
        };

        vec![
            SensorEvent::from_axes(StreamKind::Accelerometer, stamp(&mut self.rng), xyz(accel)),
            SensorEvent::from_axes(StreamKind::Gyroscope, stamp(&mut self.rng), xyz(gyro)),
            SensorEvent::from_axes(StreamKind::Gravity, stamp(&mut self.rng), xyz(gravity)),
            SensorEvent::from_axes(StreamKind::RotationVector, stamp(&mut self.rng), quaternion),
        ]
    }

    /// Events for `ticks` consecutive ticks
    pub fn generate(&mut self, ticks: usize) -> Vec<SensorEvent> {
        (0..ticks).flat_map(|_| self.next_tick()).collect()
    }

    fn noise(&mut self, amplitude: f64) -> f64 {
        if amplitude > 0.0 {
            self.rng.random_range(-amplitude..=amplitude)
        } else {
            0.0
        }
    }
}

fn xyz(v: [f64; 3]) -> [(&'static str, f64); 3] {
    [("x", v[0]), ("y", v[1]), ("z", v[2])]
}

/// Real-time synthetic source
///
/// Emits on a background thread at `frequency_hz`, like a device driver
/// delivering callbacks.
pub struct SyntheticPostureSource {
    source_id: String,
    config: SyntheticConfig,
    listening: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SyntheticPostureSource {
    pub fn new(source_id: impl Into<String>, config: SyntheticConfig) -> Self {
        Self {
            source_id: source_id.into(),
            config,
            listening: Arc::new(AtomicBool::new(false)),
            thread_handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SyntheticConfig {
        &self.config
    }
}

impl SensorSource for SyntheticPostureSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kinds(&self) -> Vec<StreamKind> {
        StreamKind::ALL.to_vec()
    }

    fn listen(&self, callback: SensorEventCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let listening = self.listening.clone();
        let source_id = self.source_id.clone();
        let mut generator = SyntheticGenerator::new(self.config.clone());
        let period = Duration::from_nanos(self.config.period_ns().max(1) as u64);

        let handle = thread::spawn(move || {
            debug!(source_id = %source_id, "synthetic source started");
            while listening.load(Ordering::Relaxed) {
                for event in generator.next_tick() {
                    callback(event);
                }
                trace!(source_id = %source_id, tick = generator.ticks(), "synthetic tick");
                thread::sleep(period);
            }
            debug!(source_id = %source_id, ticks = generator.ticks(), "synthetic source stopped");
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

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet(label: &str) -> SyntheticConfig {
        SyntheticConfig {
            sway_degrees: 0.0,
            noise: 0.0,
            jitter: 0.0,
            ..SyntheticConfig::for_posture(label).unwrap()
        }
    }

    #[test]
    fn test_one_event_per_stream_per_tick() {
        let mut generator = SyntheticGenerator::new(SyntheticConfig::default().with_seed(7));
        let events = generator.generate(3);

        assert_eq!(events.len(), 12);
        assert_eq!(generator.ticks(), 3);
        for kind in StreamKind::ALL {
            assert_eq!(events.iter().filter(|e| e.kind == kind).count(), 3);
        }
    }

    #[test]
    fn test_seeded_sequences_repeat() {
        let config = SyntheticConfig::default().with_seed(42);
        let a = SyntheticGenerator::new(config.clone()).generate(5);
        let b = SyntheticGenerator::new(config).generate(5);
        assert_eq!(a, b);
    }

    #[test]
    fn test_quiet_timestamps_follow_period() {
        let mut generator = SyntheticGenerator::new(quiet("straight"));
        let first = generator.next_tick();
        let second = generator.next_tick();
        assert!(first.iter().all(|e| e.timestamp_ns == EPOCH_NS));
        assert!(second.iter().all(|e| e.timestamp_ns == EPOCH_NS + 100_000_000));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let mut generator = SyntheticGenerator::new(SyntheticConfig::default().with_seed(1));
        for (i, chunk) in generator.generate(50).chunks(4).enumerate() {
            let nominal = EPOCH_NS + i as i64 * 100_000_000;
            for event in chunk {
                assert!((event.timestamp_ns - nominal).abs() <= 10_000_000);
            }
        }
    }

    #[test]
    fn test_flat_device_reads_gravity_on_z() {
        let events = SyntheticGenerator::new(quiet("straight")).next_tick();
        let gravity = events.iter().find(|e| e.kind == StreamKind::Gravity).unwrap();
        assert!((gravity.values["z"] - STANDARD_GRAVITY).abs() < 1e-9);
        assert!(gravity.values["x"].abs() < 1e-9);

        let rotation = events.iter().find(|e| e.kind == StreamKind::RotationVector).unwrap();
        assert!((rotation.values["w"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_slouching_tilts_forward() {
        let events = SyntheticGenerator::new(quiet("slouching")).next_tick();
        let rotation = events.iter().find(|e| e.kind == StreamKind::RotationVector).unwrap();
        // sin(14°) for a 28° pitch
        assert!((rotation.values["y"] - 14f64.to_radians().sin() * 2f64.to_radians().cos()).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(SyntheticConfig::for_posture("handstand").is_none());
        for label in POSTURE_PRESETS {
            assert!(SyntheticConfig::for_posture(label).is_some());
        }
    }

    #[test]
    fn test_listen_and_stop() {
        let source = SyntheticPostureSource::new(
            "synthetic",
            SyntheticConfig {
                frequency_hz: 200.0,
                ..SyntheticConfig::default()
            },
        );
        let count = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = count.clone();
        source.listen(Arc::new(move |_| {
            seen.fetch_add(1, Ordering::Relaxed);
        }));
        assert!(source.is_listening());
        thread::sleep(Duration::from_millis(50));
        source.stop();
        assert!(!source.is_listening());

        let after_stop = count.load(Ordering::Relaxed);
        assert!(after_stop > 0);
        thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::Relaxed), after_stop);
    }
}
