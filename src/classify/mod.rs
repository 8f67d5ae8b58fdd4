// Classification module
// Request/response types, the backend abstraction, and the two shipped
// backends: a remote LLM-backed classifier and a local heuristic one

pub mod backend;
pub mod heuristic;
pub mod remote;
pub mod types;

pub use backend::{ClassifierBackend, ClassifierError};
pub use heuristic::{HeuristicClassifier, HeuristicConfig};
pub use remote::{RemoteClassifier, RemoteConfig};
pub use types::{
    ActivityLabel, ClassificationRequest, ClassificationResponse, UNKNOWN_ACTIVITY, UNKNOWN_GLYPH,
};
