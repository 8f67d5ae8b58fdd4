// Motion sample types
// One sample per device-motion event: three linear-acceleration axes
// and three rotation-rate axes, plus a capture timestamp

use serde::{Deserialize, Serialize};

/// Nominal sampling rate of the motion stream in Hz
pub const SAMPLE_RATE_HZ: f64 = 20.0;

/// Number of scalar channels per sample
pub const CHANNEL_COUNT: usize = 6;

/// Channel names in canonical order (used in backend prompts and rationales)
pub const CHANNEL_NAMES: [&str; CHANNEL_COUNT] = [
    "accel_x", "accel_y", "accel_z", "rotation_x", "rotation_y", "rotation_z",
];

/// A single timestamped motion sample.
///
/// Immutable once created. The ingestion adapter is responsible for
/// normalizing missing or out-of-range channel values to 0.0 before a
/// sample is built; the buffering path accepts whatever arrives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    /// Capture timestamp in seconds (monotonically non-decreasing in
    /// practice, not enforced)
    pub timestamp: f64,

    /// Linear (user) acceleration in g, gravity removed
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,

    /// Rotation rate in rad/s
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub rotation_z: f64,
}

impl MotionSample {
    /// Create a sample from acceleration and rotation-rate triples
    pub fn new(timestamp: f64, accel: [f64; 3], rotation: [f64; 3]) -> Self {
        MotionSample {
            timestamp,
            accel_x: accel[0],
            accel_y: accel[1],
            accel_z: accel[2],
            rotation_x: rotation[0],
            rotation_y: rotation[1],
            rotation_z: rotation[2],
        }
    }

    /// Channel values in canonical order (accel x/y/z, rotation x/y/z)
    pub fn channels(&self) -> [f64; CHANNEL_COUNT] {
        [
            self.accel_x,
            self.accel_y,
            self.accel_z,
            self.rotation_x,
            self.rotation_y,
            self.rotation_z,
        ]
    }
}
