//! Structured logging with `tracing`.
//!
//! Connection lifecycle is logged at `info`, per-event traffic at `debug`,
//! and connection-local faults (decode failures, backpressure drops) at
//! `warn`. Fields such as `conn_id` and `event_name` are attached as
//! structured key-values rather than interpolated into messages.

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Arguments
///
/// * `level` - Minimum log level to display, e.g. `"info"`.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // try_init fails (and does nothing) if a subscriber is already set
    if subscriber.try_init().is_ok() {
        tracing::debug!(level, "logging initialized");
    }
}
