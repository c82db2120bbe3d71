//! Diagnostic output for the CLI.
//!
//! Optimizer decisions are emitted as `tracing` events under the `polytile`
//! and `polytile_passes` targets and written to stderr, so the printed
//! schedule on stdout stays clean.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Filter for a `-v` count: 0 shows the run summary, 1 every transformation
/// decision, 2 and more also the bands left alone.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "polytile=info",
        1 => "polytile=debug",
        _ => "polytile=trace",
    }
}

/// Install the subscriber once per process. `RUST_LOG` takes precedence over
/// `verbosity`.
pub fn init_logging(verbosity: u8) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(verbosity > 1)
            .without_time()
            .compact()
            .init();
    });
}
