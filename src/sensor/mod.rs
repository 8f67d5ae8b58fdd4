// Sensor module
// Motion sample types and the synthetic signal source

pub mod synthetic;
pub mod types;

pub use synthetic::{ActivityProfile, SyntheticMotionSource};
pub use types::{MotionSample, CHANNEL_COUNT, CHANNEL_NAMES, SAMPLE_RATE_HZ};
