/// Harness holding a core with a live host element.
pub mod harness;
/// Shared message recording.
pub mod log;
/// Recording widgets and layouts.
pub mod probe;

/// Install a tracing subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let _ignored = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
