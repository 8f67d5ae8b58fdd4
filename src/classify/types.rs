// Classification types
// Request/response shapes shared by every backend, and the activity label
// surfaced to consumers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Sentinel activity name used when the backend is unreachable or returns
/// an unusable response
pub const UNKNOWN_ACTIVITY: &str = "Unknown";

/// Neutral display glyph paired with the sentinel activity
pub const UNKNOWN_GLYPH: &str = "❓";

/// One classification request: the twelve feature scalars plus the
/// previous confirmed activity name as stability context.
///
/// `previous_activity` is `None` on the first classification of a session
/// (explicit "no prior context"), never an empty string.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationRequest {
    pub features: FeatureVector,
    pub previous_activity: Option<String>,
}

/// A backend's answer: an open-ended activity name (backends may emit
/// novel names), confidence in [0, 100], a short display glyph, and a
/// free-text rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResponse {
    pub activity: String,
    pub confidence: u8,
    pub glyph: String,
    pub rationale: String,
}

/// The label surfaced to consumers, pushed on every successful or
/// degraded tick. Ephemeral: recomputed each tick; only the activity name
/// is echoed back as context for the next request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLabel {
    pub activity: String,
    /// Confidence score in [0, 100]
    pub confidence: u8,
    pub glyph: String,
    pub rationale: String,
    /// When this label was computed
    pub computed_at: DateTime<Utc>,
}

impl ActivityLabel {
    /// Build a label from a backend response, timestamped now
    pub fn from_response(response: ClassificationResponse) -> Self {
        ActivityLabel {
            activity: response.activity,
            confidence: response.confidence.min(100),
            glyph: response.glyph,
            rationale: response.rationale,
            computed_at: Utc::now(),
        }
    }

    /// Sentinel label for a failed tick: "Unknown" at zero confidence.
    /// Still timestamped; does not feed back into the stability context.
    pub fn degraded() -> Self {
        ActivityLabel {
            activity: UNKNOWN_ACTIVITY.to_string(),
            confidence: 0,
            glyph: UNKNOWN_GLYPH.to_string(),
            rationale: "Classification backend unreachable".to_string(),
            computed_at: Utc::now(),
        }
    }

    /// True for the sentinel produced by a failed tick
    pub fn is_degraded(&self) -> bool {
        self.activity == UNKNOWN_ACTIVITY && self.confidence == 0
    }
}
