//! Tracing setup for binaries and demos.
//!
//! The library itself only emits `tracing` records; installing a subscriber
//! is the host's choice. [`init_tracing`] is the default used by the
//! `terminator` binary and the demos.

/// Initialize the tracing subscriber with environment filter support.
///
/// Logs at INFO level and above by default. Control the level with `RUST_LOG`:
///
/// ```bash
/// RUST_LOG=debug terminator listen
/// RUST_LOG=terminator=trace cargo run --example tcp_server
/// ```
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
