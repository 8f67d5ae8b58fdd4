// Kinesis demo
// Feeds a synthetic motion source into a session at the sensor rate and
// prints every activity label the session emits. Uses the remote LLM
// backend when an API key is present, the local heuristic otherwise.
//
// Usage: kinesis [stationary|walking|running|driving]

use std::time::Duration;

use kinesis::{
    ActivityProfile, ActivitySession, ClassifierBackend, HeuristicClassifier, RemoteClassifier,
    SessionConfig, SyntheticMotionSource, SAMPLE_RATE_HZ,
};

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let profile = std::env::args()
        .nth(1)
        .map(|arg| match ActivityProfile::parse(&arg) {
            Some(profile) => profile,
            None => {
                eprintln!("unknown profile '{}', expected one of: stationary, walking, running, driving", arg);
                std::process::exit(2);
            }
        })
        .unwrap_or(ActivityProfile::Walking);

    let duration = std::env::var("KINESIS_DEMO_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30));

    let remote = RemoteClassifier::new();
    if remote.is_configured() {
        log::info!("using remote LLM backend");
        run_demo(remote, profile, duration).await;
    } else {
        log::info!("no OPENAI_API_KEY set, using local heuristic backend");
        run_demo(HeuristicClassifier::new(), profile, duration).await;
    }
}

async fn run_demo<B: ClassifierBackend>(backend: B, profile: ActivityProfile, duration: Duration) {
    println!(
        "Simulating '{}' motion for {:?} (Ctrl-C to stop early)",
        profile.name(),
        duration
    );

    let session = ActivitySession::new(backend, SessionConfig::default());
    session.start();

    let mut labels = session.subscribe_labels();
    let printer = tokio::spawn(async move {
        while labels.changed().await.is_ok() {
            if let Some(label) = labels.borrow_and_update().clone() {
                println!(
                    "{}  {} ({}%): {}",
                    label.glyph, label.activity, label.confidence, label.rationale
                );
            }
        }
    });

    // Deliver samples at the nominal sensor rate until the demo ends
    let mut source = SyntheticMotionSource::new(profile);
    let mut ticker =
        tokio::time::interval(Duration::from_secs_f64(1.0 / SAMPLE_RATE_HZ));
    let deadline = tokio::time::Instant::now() + duration;

    loop {
        tokio::select! {
            _ = ticker.tick() => session.ingest(source.next_sample()),
            _ = tokio::time::sleep_until(deadline) => break,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.stop();
    printer.abort();
    println!("Session stopped.");
}
