// Classifier backend abstraction
// The orchestrator talks to one narrow async interface so backends can be
// swapped (remote model, local heuristic, test stub) without touching the
// buffering or orchestration logic

use std::future::Future;

use thiserror::Error;

use crate::classify::types::{ClassificationRequest, ClassificationResponse};

/// Errors a backend can surface.
///
/// None of these are fatal to a session: the orchestrator degrades the tick
/// to a sentinel label and the next tick retries independently.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("backend request failed: {0}")]
    Transport(String),

    #[error("backend request timed out")]
    Timeout,

    #[error("backend returned malformed response: {0}")]
    MalformedResponse(String),

    #[error("backend not configured: {0}")]
    NotConfigured(String),
}

/// Classification backend contract.
///
/// `previous_activity` in the request is a soft prior, and honoring it is
/// part of this interface, not an implementation detail: a backend must
/// re-affirm the prior unless the feature pattern shows a strong,
/// unambiguous shift. The orchestrator performs no smoothing of its own
/// (all hysteresis lives behind this trait), so swapping backends must
/// preserve the bias behavior for output stability.
pub trait ClassifierBackend: Send + Sync + 'static {
    fn classify(
        &self,
        request: ClassificationRequest,
    ) -> impl Future<Output = Result<ClassificationResponse, ClassifierError>> + Send;
}

// A shared backend can be handed to a session while the caller keeps a handle
impl<T: ClassifierBackend> ClassifierBackend for std::sync::Arc<T> {
    fn classify(
        &self,
        request: ClassificationRequest,
    ) -> impl Future<Output = Result<ClassificationResponse, ClassifierError>> + Send {
        T::classify(self, request)
    }
}
