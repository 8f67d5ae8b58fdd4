// Feature extraction
// Per-channel mean and population standard deviation over a window snapshot

use serde::{Deserialize, Serialize};

use crate::sensor::{MotionSample, CHANNEL_COUNT};
use crate::window::DEFAULT_CAPACITY;

/// Minimum samples before extraction yields a result: 40% of the default
/// window capacity, roughly 2 seconds of data at the nominal rate. Below
/// this the window is still warming up and classification would be noise.
pub const MIN_SAMPLES: usize = DEFAULT_CAPACITY * 2 / 5;

/// Mean and population standard deviation of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// Twelve-scalar statistical summary of a window: mean and population
/// standard deviation for each of the six motion channels.
///
/// Derived from a snapshot at a point in time; not retained by the core
/// beyond one classification tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub accel_x: ChannelStats,
    pub accel_y: ChannelStats,
    pub accel_z: ChannelStats,
    pub rotation_x: ChannelStats,
    pub rotation_y: ChannelStats,
    pub rotation_z: ChannelStats,
}

impl FeatureVector {
    /// Channel statistics in canonical order (accel x/y/z, rotation x/y/z)
    pub fn channels(&self) -> [ChannelStats; CHANNEL_COUNT] {
        [
            self.accel_x,
            self.accel_y,
            self.accel_z,
            self.rotation_x,
            self.rotation_y,
            self.rotation_z,
        ]
    }

    /// Euclidean norm of the three acceleration standard deviations.
    /// A single "how hard is the device moving" figure used by the
    /// heuristic backend and in rationales.
    pub fn accel_activity(&self) -> f64 {
        (self.accel_x.std_dev.powi(2)
            + self.accel_y.std_dev.powi(2)
            + self.accel_z.std_dev.powi(2))
        .sqrt()
    }

    /// Euclidean norm of the three rotation-rate standard deviations
    pub fn rotation_activity(&self) -> f64 {
        (self.rotation_x.std_dev.powi(2)
            + self.rotation_y.std_dev.powi(2)
            + self.rotation_z.std_dev.powi(2))
        .sqrt()
    }
}

/// Extract features from a window snapshot using the default minimum.
///
/// Returns `None` while the window holds fewer than [`MIN_SAMPLES`]
/// samples. That is the normal warm-up state, not an error; callers skip
/// the tick cleanly.
pub fn extract(samples: &[MotionSample]) -> Option<FeatureVector> {
    extract_with_min(samples, MIN_SAMPLES)
}

/// Extract features with an explicit minimum sample count (clamped to 1)
pub fn extract_with_min(samples: &[MotionSample], min_samples: usize) -> Option<FeatureVector> {
    if samples.len() < min_samples.max(1) {
        return None;
    }

    let stats = [
        channel_stats(samples, 0),
        channel_stats(samples, 1),
        channel_stats(samples, 2),
        channel_stats(samples, 3),
        channel_stats(samples, 4),
        channel_stats(samples, 5),
    ];

    Some(FeatureVector {
        accel_x: stats[0],
        accel_y: stats[1],
        accel_z: stats[2],
        rotation_x: stats[3],
        rotation_y: stats[4],
        rotation_z: stats[5],
    })
}

/// Mean and population standard deviation (divide by N) of one channel.
/// Total for any N >= 1: a single sample yields std_dev 0, never NaN.
fn channel_stats(samples: &[MotionSample], channel: usize) -> ChannelStats {
    let n = samples.len() as f64;

    let mean = samples.iter().map(|s| s.channels()[channel]).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|s| {
            let d = s.channels()[channel] - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    ChannelStats {
        mean,
        std_dev: variance.sqrt(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant_sample(value: f64) -> MotionSample {
        MotionSample::new(0.0, [value; 3], [value; 3])
    }

    fn samples_on_accel_x(values: &[f64]) -> Vec<MotionSample> {
        values
            .iter()
            .map(|&v| MotionSample::new(0.0, [v, 0.0, 0.0], [0.0, 0.0, 0.0]))
            .collect()
    }

    #[test]
    fn test_below_threshold_is_insufficient_data() {
        let samples = vec![constant_sample(1.0); MIN_SAMPLES - 1];
        assert!(extract(&samples).is_none());
    }

    #[test]
    fn test_at_threshold_yields_features() {
        let samples = vec![constant_sample(1.0); MIN_SAMPLES];
        assert!(extract(&samples).is_some());
    }

    #[test]
    fn test_capacity_100_threshold_40_scenario() {
        // 39 samples: insufficient; one more makes 40 and extraction succeeds
        let mut samples = vec![constant_sample(0.5); 39];
        assert!(extract_with_min(&samples, 40).is_none());

        samples.push(constant_sample(0.5));
        assert!(extract_with_min(&samples, 40).is_some());
    }

    #[test]
    fn test_identical_samples_zero_std_mean_is_value() {
        let samples = vec![constant_sample(2.5); MIN_SAMPLES];
        let features = extract(&samples).unwrap();

        for stats in features.channels() {
            assert_eq!(stats.mean, 2.5);
            assert_eq!(stats.std_dev, 0.0);
        }
    }

    #[test]
    fn test_matches_reference_formula() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, -1.5, 0.25, 7.75];
        let samples = samples_on_accel_x(&values);
        let features = extract_with_min(&samples, 1).unwrap();

        let n = values.len() as f64;
        let mean: f64 = values.iter().sum::<f64>() / n;
        let variance: f64 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        assert!((features.accel_x.mean - mean).abs() / mean.abs() < 1e-9);
        assert!((features.accel_x.std_dev - std_dev).abs() / std_dev < 1e-9);
    }

    #[test]
    fn test_single_sample_is_finite() {
        let samples = samples_on_accel_x(&[3.0]);
        let features = extract_with_min(&samples, 1).unwrap();

        assert_eq!(features.accel_x.mean, 3.0);
        assert_eq!(features.accel_x.std_dev, 0.0);
        for stats in features.channels() {
            assert!(stats.mean.is_finite());
            assert!(stats.std_dev.is_finite());
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let samples: Vec<MotionSample> = (0..MIN_SAMPLES)
            .map(|i| MotionSample::new(i as f64, [i as f64, 5.0, 0.0], [0.0, 0.0, -2.0]))
            .collect();
        let features = extract(&samples).unwrap();

        // Constant channels unaffected by the varying one
        assert_eq!(features.accel_y.mean, 5.0);
        assert_eq!(features.accel_y.std_dev, 0.0);
        assert_eq!(features.rotation_z.mean, -2.0);
        assert_eq!(features.rotation_z.std_dev, 0.0);
        assert!(features.accel_x.std_dev > 0.0);
    }

    #[test]
    fn test_activity_norms() {
        let samples = samples_on_accel_x(&[-1.0, 1.0, -1.0, 1.0]);
        let features = extract_with_min(&samples, 1).unwrap();

        // Only accel_x varies: norm equals its std deviation
        assert!((features.accel_activity() - 1.0).abs() < 1e-12);
        assert_eq!(features.rotation_activity(), 0.0);
    }
}
