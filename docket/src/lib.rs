use std::sync::Arc;

use docket_core::storage::SystemHost;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod commands;

pub struct AppContext {
    pub host: Arc<SystemHost>,
}

/// Returns the default log filter for the given `-v` count and `-q` flag.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over the flags.
///
/// Logs go to stderr so that JSON printed on stdout stays machine-readable.
pub fn init_tracing(verbose: u8, quiet: bool) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter(verbose, quiet))),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
