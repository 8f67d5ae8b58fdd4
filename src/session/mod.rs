// Activity session
// Lifecycle controller and classification orchestrator. Owns the sample
// window and the stability context, drives the periodic classification
// tick, and surfaces labels to consumers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::classify::{ActivityLabel, ClassificationRequest, ClassifierBackend};
use crate::features::{self, FeatureVector, MIN_SAMPLES};
use crate::sensor::MotionSample;
use crate::window::{SampleWindow, DEFAULT_CAPACITY};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

/// Configuration for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sample window capacity
    pub window_capacity: usize,

    /// Minimum buffered samples before a tick classifies (40% of the
    /// window capacity by default, roughly 2 seconds of history)
    pub min_samples: usize,

    /// Classification cadence, independent of the sampling rate
    pub tick_interval: Duration,

    /// Upper bound on one backend call. Kept at or below the tick
    /// interval so a hung call cannot starve subsequent ticks.
    pub backend_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            window_capacity: DEFAULT_CAPACITY,
            min_samples: MIN_SAMPLES,
            tick_interval: Duration::from_secs(2),
            backend_timeout: Duration::from_secs(2),
        }
    }
}

/// State shared between the session handle and its tick task
struct SessionShared {
    config: SessionConfig,
    window: Mutex<SampleWindow>,
    /// Previous confirmed activity name, the bias forwarded to the
    /// backend on every request. Never written by a degraded tick.
    previous_activity: Mutex<Option<String>>,
    latest_sample: Mutex<Option<MotionSample>>,
    label_tx: watch::Sender<Option<ActivityLabel>>,
    active: AtomicBool,
    /// Bumped on every stop; a tick whose epoch no longer matches
    /// discards its result instead of committing it
    epoch: AtomicU64,
    /// At most one backend request may be outstanding per session
    in_flight: AtomicBool,
}

/// A motion-classification session.
///
/// One instance per logical session; no process-wide state, so multiple
/// independent sessions (and tests) can run in isolation. `start` and
/// `stop` are idempotent. Requires a tokio runtime.
pub struct ActivitySession<B: ClassifierBackend> {
    shared: Arc<SessionShared>,
    backend: Arc<B>,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

impl<B: ClassifierBackend> ActivitySession<B> {
    /// Create an idle session with the given backend and configuration
    pub fn new(backend: B, config: SessionConfig) -> Self {
        let (label_tx, _) = watch::channel(None);
        let window = SampleWindow::with_capacity(config.window_capacity);

        ActivitySession {
            shared: Arc::new(SessionShared {
                config,
                window: Mutex::new(window),
                previous_activity: Mutex::new(None),
                latest_sample: Mutex::new(None),
                label_tx,
                active: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                in_flight: AtomicBool::new(false),
            }),
            backend: Arc::new(backend),
            tick_task: Mutex::new(None),
        }
    }

    /// Create an idle session with the default configuration
    pub fn with_defaults(backend: B) -> Self {
        Self::new(backend, SessionConfig::default())
    }

    /// Start the session: clear the window and stability context, begin
    /// accepting samples, and start the tick cadence. No-op when already
    /// active.
    pub fn start(&self) -> SessionState {
        if self.shared.active.swap(true, Ordering::SeqCst) {
            return SessionState::Active;
        }

        // A fresh session starts with no history and no bias
        self.shared.window.lock().unwrap().reset();
        *self.shared.previous_activity.lock().unwrap() = None;
        *self.shared.latest_sample.lock().unwrap() = None;
        self.shared.in_flight.store(false, Ordering::SeqCst);

        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move {
            run_session_loop(shared, backend, epoch).await;
        });
        *self.tick_task.lock().unwrap() = Some(handle);

        log::info!(
            "session started (window capacity {}, tick every {:?})",
            self.shared.config.window_capacity,
            self.shared.config.tick_interval
        );
        SessionState::Active
    }

    /// Stop the session: cancel the tick cadence and clear the window and
    /// stability context. Any in-flight classification result is
    /// discarded, never committed. No-op when already idle.
    pub fn stop(&self) -> SessionState {
        if !self.shared.active.swap(false, Ordering::SeqCst) {
            return SessionState::Idle;
        }

        // Invalidate any in-flight tick before touching state
        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.tick_task.lock().unwrap().take() {
            handle.abort();
        }

        self.shared.window.lock().unwrap().reset();
        *self.shared.previous_activity.lock().unwrap() = None;
        self.shared.in_flight.store(false, Ordering::SeqCst);

        log::info!("session stopped");
        SessionState::Idle
    }

    /// Deliver one sample from the sensor source. Samples arriving while
    /// the session is idle are dropped.
    pub fn ingest(&self, sample: MotionSample) {
        if !self.shared.active.load(Ordering::SeqCst) {
            return;
        }
        *self.shared.latest_sample.lock().unwrap() = Some(sample);
        self.shared.window.lock().unwrap().append(sample);
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        if self.shared.active.load(Ordering::SeqCst) {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    /// True while the session is active
    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Most recent raw sample (live display)
    pub fn latest_sample(&self) -> Option<MotionSample> {
        *self.shared.latest_sample.lock().unwrap()
    }

    /// Features over the current window, computed on demand. `None` while
    /// the window is still warming up.
    pub fn current_features(&self) -> Option<FeatureVector> {
        let snapshot = self.shared.window.lock().unwrap().snapshot();
        features::extract_with_min(&snapshot, self.shared.config.min_samples)
    }

    /// Most recent label (successful or degraded), if any tick has run
    pub fn latest_label(&self) -> Option<ActivityLabel> {
        self.shared.label_tx.borrow().clone()
    }

    /// Subscribe to label pushes; the channel updates on every successful
    /// or degraded tick
    pub fn subscribe_labels(&self) -> watch::Receiver<Option<ActivityLabel>> {
        self.shared.label_tx.subscribe()
    }

    /// The previous confirmed activity name currently used as bias
    pub fn stability_context(&self) -> Option<String> {
        self.shared.previous_activity.lock().unwrap().clone()
    }
}

impl<B: ClassifierBackend> Drop for ActivitySession<B> {
    fn drop(&mut self) {
        if let Some(handle) = self.tick_task.lock().unwrap().take() {
            handle.abort();
        }
    }
}

/// Tick loop for one session epoch. Ticks are serialized: a tick that
/// becomes due while a backend call is still pending is skipped, so two
/// requests are never in flight for the same session.
async fn run_session_loop<B: ClassifierBackend>(
    shared: Arc<SessionShared>,
    backend: Arc<B>,
    epoch: u64,
) {
    let mut interval = tokio::time::interval(shared.config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first interval fire is immediate; consume it so the first
    // classification happens one full interval after start
    interval.tick().await;

    loop {
        interval.tick().await;
        if shared.epoch.load(Ordering::SeqCst) != epoch
            || !shared.active.load(Ordering::SeqCst)
        {
            break;
        }
        run_tick(&shared, backend.as_ref(), epoch).await;
    }
}

/// One classification tick.
///
/// Insufficient data skips the tick with no request and no state change.
/// A successful response commits both the label and the stability
/// context; a failure commits a degraded label and leaves the context
/// untouched. A result arriving after `stop` is discarded entirely.
async fn run_tick<B: ClassifierBackend>(shared: &SessionShared, backend: &B, epoch: u64) {
    if shared.in_flight.swap(true, Ordering::SeqCst) {
        log::debug!("classification already in flight, dropping tick");
        return;
    }

    let snapshot = shared.window.lock().unwrap().snapshot();
    match features::extract_with_min(&snapshot, shared.config.min_samples) {
        None => {
            log::debug!(
                "insufficient data ({} of {} samples), skipping tick",
                snapshot.len(),
                shared.config.min_samples
            );
        }
        Some(features) => {
            let request = ClassificationRequest {
                features,
                previous_activity: shared.previous_activity.lock().unwrap().clone(),
            };
            let outcome =
                tokio::time::timeout(shared.config.backend_timeout, backend.classify(request))
                    .await;

            // A response landing after stop() must not resurrect state for
            // a session that may have been restarted in the interim
            if shared.epoch.load(Ordering::SeqCst) != epoch {
                log::debug!("session stopped during classification, discarding result");
                shared.in_flight.store(false, Ordering::SeqCst);
                return;
            }

            let label = match outcome {
                Ok(Ok(response)) => {
                    let label = ActivityLabel::from_response(response);
                    *shared.previous_activity.lock().unwrap() = Some(label.activity.clone());
                    log::info!("classified as {} ({}%)", label.activity, label.confidence);
                    label
                }
                Ok(Err(e)) => {
                    // Degraded: the stability context keeps its last good
                    // value so a transient outage cannot poison the bias
                    log::warn!("classification failed: {}", e);
                    ActivityLabel::degraded()
                }
                Err(_) => {
                    log::warn!(
                        "classification timed out after {:?}",
                        shared.config.backend_timeout
                    );
                    ActivityLabel::degraded()
                }
            };
            shared.label_tx.send_replace(Some(label));
        }
    }

    shared.in_flight.store(false, Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassificationResponse, ClassifierError};
    use std::future::Future;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;

    fn sample(n: usize) -> MotionSample {
        MotionSample::new(n as f64 / 20.0, [0.1, 0.0, 0.2], [0.0, 0.1, 0.0])
    }

    fn fill_window<B: ClassifierBackend>(session: &ActivitySession<B>, count: usize) {
        for n in 0..count {
            session.ingest(sample(n));
        }
    }

    /// Always answers with a fixed activity, recording the priors it saw
    struct StubBackend {
        activity: &'static str,
        calls: AtomicUsize,
        seen_priors: Mutex<Vec<Option<String>>>,
    }

    impl StubBackend {
        fn answering(activity: &'static str) -> Arc<Self> {
            Arc::new(StubBackend {
                activity,
                calls: AtomicUsize::new(0),
                seen_priors: Mutex::new(Vec::new()),
            })
        }
    }

    impl ClassifierBackend for StubBackend {
        fn classify(
            &self,
            request: ClassificationRequest,
        ) -> impl Future<Output = Result<ClassificationResponse, ClassifierError>> + Send
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen_priors
                .lock()
                .unwrap()
                .push(request.previous_activity);
            let activity = self.activity.to_string();
            async move {
                Ok(ClassificationResponse {
                    activity,
                    confidence: 90,
                    glyph: "🚶".to_string(),
                    rationale: "stub".to_string(),
                })
            }
        }
    }

    /// Always fails with a transport error
    struct FailingBackend;

    impl ClassifierBackend for FailingBackend {
        fn classify(
            &self,
            _request: ClassificationRequest,
        ) -> impl Future<Output = Result<ClassificationResponse, ClassifierError>> + Send
        {
            async { Err(ClassifierError::Transport("connection refused".to_string())) }
        }
    }

    /// Blocks until released, tracking how many calls overlap
    struct GatedBackend {
        release: Notify,
        calls: AtomicUsize,
        concurrent: AtomicUsize,
        max_concurrent: AtomicUsize,
    }

    impl GatedBackend {
        fn new() -> Arc<Self> {
            Arc::new(GatedBackend {
                release: Notify::new(),
                calls: AtomicUsize::new(0),
                concurrent: AtomicUsize::new(0),
                max_concurrent: AtomicUsize::new(0),
            })
        }
    }

    impl ClassifierBackend for GatedBackend {
        fn classify(
            &self,
            _request: ClassificationRequest,
        ) -> impl Future<Output = Result<ClassificationResponse, ClassifierError>> + Send
        {
            async {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_concurrent.fetch_max(now, Ordering::SeqCst);

                self.release.notified().await;

                self.concurrent.fetch_sub(1, Ordering::SeqCst);
                Ok(ClassificationResponse {
                    activity: "Walking".to_string(),
                    confidence: 80,
                    glyph: "🚶".to_string(),
                    rationale: "gated".to_string(),
                })
            }
        }
    }

    #[tokio::test]
    async fn test_start_and_stop_are_idempotent() {
        let session = ActivitySession::with_defaults(StubBackend::answering("Walking"));

        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.stop(), SessionState::Idle);

        assert_eq!(session.start(), SessionState::Active);
        assert_eq!(session.start(), SessionState::Active);
        assert!(session.is_active());

        assert_eq!(session.stop(), SessionState::Idle);
        assert_eq!(session.stop(), SessionState::Idle);
    }

    #[tokio::test]
    async fn test_samples_are_dropped_while_idle() {
        let session = ActivitySession::with_defaults(StubBackend::answering("Walking"));

        session.ingest(sample(0));
        assert!(session.latest_sample().is_none());

        session.start();
        session.ingest(sample(1));
        assert!(session.latest_sample().is_some());
        assert_eq!(session.shared.window.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stop_clears_window_and_context() {
        let session = ActivitySession::with_defaults(StubBackend::answering("Walking"));
        session.start();
        fill_window(&session, 50);
        *session.shared.previous_activity.lock().unwrap() = Some("Walking".to_string());

        session.stop();
        assert_eq!(session.shared.window.lock().unwrap().len(), 0);
        assert!(session.stability_context().is_none());

        // A fresh session warms up from scratch
        session.start();
        assert!(session.current_features().is_none());
        fill_window(&session, MIN_SAMPLES);
        assert!(session.current_features().is_some());
    }

    #[tokio::test]
    async fn test_tick_skips_cleanly_on_insufficient_data() {
        let backend = StubBackend::answering("Walking");
        let session = ActivitySession::with_defaults(Arc::clone(&backend));
        session.start();
        fill_window(&session, MIN_SAMPLES - 1);

        let epoch = session.shared.epoch.load(Ordering::SeqCst);
        run_tick(&session.shared, &*session.backend, epoch).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(session.latest_label().is_none());
        assert!(session.stability_context().is_none());
    }

    #[tokio::test]
    async fn test_successful_tick_commits_label_and_context() {
        let backend = StubBackend::answering("Walking");
        let session = ActivitySession::with_defaults(Arc::clone(&backend));
        session.start();
        fill_window(&session, MIN_SAMPLES);

        let epoch = session.shared.epoch.load(Ordering::SeqCst);
        run_tick(&session.shared, &*session.backend, epoch).await;

        let label = session.latest_label().expect("label after tick");
        assert_eq!(label.activity, "Walking");
        assert_eq!(label.confidence, 90);
        assert_eq!(session.stability_context().as_deref(), Some("Walking"));

        // First request carried no prior; the second carries the new label
        run_tick(&session.shared, &*session.backend, epoch).await;
        let priors = backend.seen_priors.lock().unwrap();
        assert_eq!(priors[0], None);
        assert_eq!(priors[1].as_deref(), Some("Walking"));
    }

    #[tokio::test]
    async fn test_failed_tick_degrades_and_preserves_context() {
        let session = ActivitySession::with_defaults(FailingBackend);
        session.start();
        fill_window(&session, MIN_SAMPLES);
        *session.shared.previous_activity.lock().unwrap() = Some("Running".to_string());

        let epoch = session.shared.epoch.load(Ordering::SeqCst);
        run_tick(&session.shared, &*session.backend, epoch).await;

        let label = session.latest_label().expect("degraded label after tick");
        assert!(label.is_degraded());
        assert_eq!(label.activity, "Unknown");
        assert_eq!(label.confidence, 0);

        // The failed tick must not poison the bias
        assert_eq!(session.stability_context().as_deref(), Some("Running"));
    }

    #[tokio::test]
    async fn test_overlapping_ticks_never_run_two_requests() {
        let backend = GatedBackend::new();
        let session = ActivitySession::with_defaults(Arc::clone(&backend));
        session.start();
        fill_window(&session, MIN_SAMPLES);
        let epoch = session.shared.epoch.load(Ordering::SeqCst);

        let shared = Arc::clone(&session.shared);
        let task_backend = Arc::clone(&session.backend);
        let first = tokio::spawn(async move {
            run_tick(&shared, &*task_backend, epoch).await;
        });
        tokio::task::yield_now().await;

        // A second tick becomes due while the first is in flight
        run_tick(&session.shared, &*session.backend, epoch).await;

        backend.release.notify_one();
        first.await.unwrap();

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.max_concurrent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_after_stop_is_discarded() {
        let backend = GatedBackend::new();
        let session = ActivitySession::with_defaults(Arc::clone(&backend));
        session.start();
        fill_window(&session, MIN_SAMPLES);
        let epoch = session.shared.epoch.load(Ordering::SeqCst);

        let shared = Arc::clone(&session.shared);
        let task_backend = Arc::clone(&session.backend);
        let tick = tokio::spawn(async move {
            run_tick(&shared, &*task_backend, epoch).await;
        });
        tokio::task::yield_now().await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        // Stop while the backend call is pending, then let it resolve
        session.stop();
        backend.release.notify_one();
        tick.await.unwrap();

        assert!(session.latest_label().is_none());
        assert!(session.stability_context().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_session_emits_labels_on_cadence() {
        let backend = StubBackend::answering("Walking");
        let session = ActivitySession::with_defaults(Arc::clone(&backend));
        let mut labels = session.subscribe_labels();

        session.start();
        fill_window(&session, MIN_SAMPLES);

        // Paused time auto-advances; the first classification lands one
        // tick interval after start
        tokio::time::sleep(Duration::from_millis(2100)).await;
        tokio::task::yield_now().await;

        assert!(labels.has_changed().unwrap());
        let label = labels.borrow_and_update().clone().unwrap();
        assert_eq!(label.activity, "Walking");

        session.stop();
    }
}
