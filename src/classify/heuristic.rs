// Heuristic (rule-based) activity classifier
// Scores hand-crafted feature bands for a small set of everyday activities.
// Serves as the no-network default backend and as the reference
// implementation of the soft-prior stability contract.

use crate::classify::backend::{ClassifierBackend, ClassifierError};
use crate::classify::types::{ClassificationRequest, ClassificationResponse};
use crate::features::FeatureVector;

/// Activities the heuristic can emit, with their display glyphs
const ACTIVITIES: [(&str, &str); 4] = [
    ("Stationary", "🧍"),
    ("Walking", "🚶"),
    ("Running", "🏃"),
    ("Driving", "🚗"),
];

/// Configuration for scoring weights and the stability margin
#[derive(Debug, Clone)]
pub struct HeuristicConfig {
    /// Weight of the acceleration-band score [0.0, ...]
    pub accel_weight: f64,

    /// Weight of the rotation-band score [0.0, ...]
    pub rotation_weight: f64,

    /// Soft-prior margin: when the top score beats the previous activity's
    /// score by no more than this, the previous activity is re-affirmed
    pub reaffirm_margin: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        HeuristicConfig {
            accel_weight: 1.5, // Acceleration is the more discriminative channel
            rotation_weight: 1.0,
            reaffirm_margin: 0.15,
        }
    }
}

/// Rule-based classifier over the twelve window features.
///
/// Scores each activity from the aggregate acceleration and rotation
/// activity norms, then applies the soft-prior contract: an ambiguous
/// winner never displaces the previous activity.
pub struct HeuristicClassifier {
    config: HeuristicConfig,
}

impl HeuristicClassifier {
    /// Create a classifier with default configuration
    pub fn new() -> Self {
        HeuristicClassifier {
            config: HeuristicConfig::default(),
        }
    }

    /// Create a classifier with custom configuration
    pub fn with_config(config: HeuristicConfig) -> Self {
        HeuristicClassifier { config }
    }

    /// Classify a request synchronously. Total: always produces a response.
    pub fn evaluate(&self, request: &ClassificationRequest) -> ClassificationResponse {
        let accel = request.features.accel_activity();
        let rotation = request.features.rotation_activity();

        let scores: Vec<(&str, &str, f64)> = ACTIVITIES
            .iter()
            .map(|&(name, glyph)| (name, glyph, self.score(name, &request.features)))
            .collect();

        let &(top_name, top_glyph, top_score) = scores
            .iter()
            .max_by(|a, b| a.2.partial_cmp(&b.2).unwrap())
            .unwrap();

        // Soft prior: keep the previous activity unless the winner is
        // clearly ahead of it
        let reaffirmed = request.previous_activity.as_deref().and_then(|prev| {
            scores
                .iter()
                .find(|(name, _, _)| name.eq_ignore_ascii_case(prev))
                .filter(|&&(name, _, score)| {
                    name != top_name && top_score - score <= self.config.reaffirm_margin
                })
                .copied()
        });

        let (name, glyph, score, rationale) = match reaffirmed {
            Some((name, glyph, score)) => (
                name,
                glyph,
                score,
                format!(
                    "accel σ {:.3} g, rotation σ {:.3} rad/s are ambiguous between {} and {}; \
                     kept the previous activity",
                    accel, rotation, top_name, name
                ),
            ),
            None => (
                top_name,
                top_glyph,
                top_score,
                format!(
                    "accel σ {:.3} g, rotation σ {:.3} rad/s best matched the {} profile",
                    accel, rotation, top_name
                ),
            ),
        };

        ClassificationResponse {
            activity: name.to_string(),
            confidence: (score * 100.0).round().clamp(0.0, 100.0) as u8,
            glyph: glyph.to_string(),
            rationale,
        }
    }

    /// Weighted score for one activity in [0.0, 1.0]
    fn score(&self, activity: &str, features: &FeatureVector) -> f64 {
        let accel = features.accel_activity();
        let rotation = features.rotation_activity();

        let (accel_score, rotation_score) = match activity {
            "Stationary" => (Self::score_stationary_accel(accel), Self::score_stationary_rotation(rotation)),
            "Walking" => (Self::score_walking_accel(accel), Self::score_walking_rotation(rotation)),
            "Running" => (Self::score_running_accel(accel), Self::score_running_rotation(rotation)),
            "Driving" => (Self::score_driving_accel(accel), Self::score_driving_rotation(rotation)),
            _ => (0.0, 0.0),
        };

        let total_weight = self.config.accel_weight + self.config.rotation_weight;
        ((accel_score * self.config.accel_weight + rotation_score * self.config.rotation_weight)
            / total_weight)
            .clamp(0.0, 1.0)
    }

    // Stationary: both channels near the sensor noise floor
    fn score_stationary_accel(a: f64) -> f64 {
        if a < 0.03 {
            1.0
        } else if a < 0.07 {
            0.7
        } else if a < 0.12 {
            0.3
        } else {
            0.05
        }
    }

    fn score_stationary_rotation(r: f64) -> f64 {
        if r < 0.02 {
            1.0
        } else if r < 0.06 {
            0.6
        } else if r < 0.12 {
            0.3
        } else {
            0.05
        }
    }

    // Walking: moderate periodic acceleration with clear arm-swing rotation
    fn score_walking_accel(a: f64) -> f64 {
        if (0.18..0.6).contains(&a) {
            1.0
        } else if (0.1..0.8).contains(&a) {
            0.65
        } else {
            0.1
        }
    }

    fn score_walking_rotation(r: f64) -> f64 {
        if (0.15..0.9).contains(&r) {
            1.0
        } else if (0.06..1.3).contains(&r) {
            0.6
        } else {
            0.2
        }
    }

    // Running: hard impacts and fast limb rotation
    fn score_running_accel(a: f64) -> f64 {
        if a > 0.7 {
            1.0
        } else if a > 0.45 {
            0.7
        } else if a > 0.3 {
            0.3
        } else {
            0.05
        }
    }

    fn score_running_rotation(r: f64) -> f64 {
        if r > 0.9 {
            1.0
        } else if r > 0.5 {
            0.7
        } else if r > 0.25 {
            0.3
        } else {
            0.1
        }
    }

    // Driving: engine vibration above the noise floor, almost no rotation
    fn score_driving_accel(a: f64) -> f64 {
        if (0.05..0.18).contains(&a) {
            1.0
        } else if (0.03..0.28).contains(&a) {
            0.6
        } else if a < 0.03 {
            0.3
        } else {
            0.1
        }
    }

    fn score_driving_rotation(r: f64) -> f64 {
        if r < 0.05 {
            1.0
        } else if r < 0.12 {
            0.6
        } else if r < 0.25 {
            0.3
        } else {
            0.05
        }
    }
}

impl Default for HeuristicClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierBackend for HeuristicClassifier {
    fn classify(
        &self,
        request: ClassificationRequest,
    ) -> impl std::future::Future<Output = Result<ClassificationResponse, ClassifierError>> + Send
    {
        let response = self.evaluate(&request);
        async move { Ok(response) }
    }
}
