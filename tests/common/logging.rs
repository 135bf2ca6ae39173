use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes tracing for tests exactly once. Control verbosity with
/// `RUST_LOG`.
pub fn setup() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}
