//! Shared `tracing` setup for both binaries.

use tracing::Level;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Initializes the global tracing subscriber.
///
/// Respects `RUST_LOG`, falling back to `INFO`. When built with the
/// `systemd` feature, events also go to the systemd journal, which matters
/// once a process has daemonized and closed its own stderr.
pub fn init(#[cfg(feature = "tracing-journald")] journald: bool) {
    let subscriber = tracing_subscriber::registry();

    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let subscriber = subscriber.with(filter);

    #[cfg(feature = "tracing-journald")]
    if journald {
        match tracing_journald::layer() {
            Ok(layer) => {
                subscriber.with(layer).init();
                return;
            }
            Err(e) => {
                eprintln!("failed to connect to the systemd journal: {e}");
            }
        }
    }

    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    subscriber.with(layer).init();
}
