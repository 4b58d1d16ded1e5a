//! Monitor runtime settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cycle timing and delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Processing cycle period
    #[serde(with = "millis", default = "default_period")]
    pub period: Duration,

    /// Prediction channel capacity; a full channel drops new predictions
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_period() -> Duration {
    Duration::from_secs(1)
}

fn default_channel_capacity() -> usize {
    16
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            period: default_period(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl MonitorSettings {
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
