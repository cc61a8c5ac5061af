pub mod fake_executor;
pub mod recorder;

use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

/// Upper bound for any single plan run or executor call in the suite. A
/// wedged wave (a worker that never resolves) or a poll loop that misses its
/// cancellation would otherwise hang the whole test run.
const TEST_DEADLINE: Duration = Duration::from_secs(5);

/// Install a tracing subscriber wired to the test harness's output capture,
/// so runner/executor logs only surface for failing tests (or with
/// `-- --nocapture`). Level comes from `RUST_LOG`, defaulting to `info`.
///
/// Call it at the top of every test; repeat calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // try_init fails once a subscriber is installed; later tests in the same
    // binary just reuse the first one.
    let _ = fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .try_init();
}

/// Await `f`, failing the test if it outlives [`TEST_DEADLINE`].
pub async fn with_timeout<F>(f: F) -> F::Output
where
    F: std::future::Future,
{
    match tokio::time::timeout(TEST_DEADLINE, f).await {
        Ok(value) => value,
        Err(_) => panic!(
            "future still pending after {TEST_DEADLINE:?}; a wave or poll loop is likely wedged"
        ),
    }
}
