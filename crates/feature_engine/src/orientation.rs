//! Rotation vector → yaw/pitch/roll (degrees), Z-Y-X Euler convention.
//!
//! The angle convention is an interop contract with the trained model: do
//! not change axis order or wrapping.

use contracts::{SampleValues, SensorSample};

/// Euler angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// `[0, 360)`
    pub yaw: f64,
    /// `[-90, 90]`
    pub pitch: f64,
    /// `(-180, 180]`
    pub roll: f64,
}

impl Orientation {
    /// Column values in `yaw, pitch, roll` order
    pub fn into_values(self) -> SampleValues {
        [
            ("yaw".to_string(), self.yaw),
            ("pitch".to_string(), self.pitch),
            ("roll".to_string(), self.roll),
        ]
        .into()
    }
}

/// Wrap degrees into `[0, 360)`
#[inline]
pub fn normalize_yaw(degrees: f64) -> f64 {
    let wrapped = ((degrees % 360.0) + 360.0) % 360.0;
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Resolve a unit-quaternion rotation vector
///
/// A missing `w` is reconstructed from the vector part. Zero magnitude
/// yields all-zero angles.
pub fn resolve(x: f64, y: f64, z: f64, w: Option<f64>) -> Orientation {
    let w = w.unwrap_or_else(|| (1.0 - (x * x + y * y + z * z)).max(0.0).sqrt());

    let norm = (w * w + x * x + y * y + z * z).sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return Orientation::default();
    }
    let (qw, qx, qy, qz) = (w / norm, x / norm, y / norm, z / norm);

    let roll = (2.0 * (qw * qx + qy * qz)).atan2(1.0 - 2.0 * (qx * qx + qy * qy));
    let pitch = (2.0 * (qw * qy - qz * qx)).clamp(-1.0, 1.0).asin();
    let yaw = (2.0 * (qw * qz + qx * qy)).atan2(1.0 - 2.0 * (qy * qy + qz * qz));

    Orientation {
        yaw: normalize_yaw(yaw.to_degrees()),
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
    }
}

/// Convert a rotation-vector sample into an orientation sample
///
/// `None` when any of `x`, `y`, `z` is absent.
pub fn resolve_sample(sample: &SensorSample) -> Option<SensorSample> {
    let orientation = resolve(
        sample.value("x")?,
        sample.value("y")?,
        sample.value("z")?,
        sample.value("w"),
    );
    Some(SensorSample::new(sample.timestamp, orientation.into_values()))
}
