// Kinesis - Streaming motion-to-activity recognition engine
// Module declarations

pub mod classify;
pub mod features;
pub mod sensor;
pub mod session;
pub mod window;

pub use classify::{
    ActivityLabel, ClassificationRequest, ClassificationResponse, ClassifierBackend,
    ClassifierError, HeuristicClassifier, RemoteClassifier,
};
pub use features::{FeatureVector, MIN_SAMPLES};
pub use sensor::{ActivityProfile, MotionSample, SyntheticMotionSource, SAMPLE_RATE_HZ};
pub use session::{ActivitySession, SessionConfig, SessionState};
pub use window::{SampleWindow, DEFAULT_CAPACITY};
