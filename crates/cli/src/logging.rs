//! Console + run-log setup.
//!
//! Progress and warnings go to stderr. When a log file is given, everything
//! (including the metric reports printed to stdout) is also appended to it
//! without ANSI colors.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::CliError;

/// Target for report text that is already on stdout; the console layer skips it.
pub const REPORT_TARGET: &str = "contactcheck::report";

const VERBOSE_DIRECTIVES: &str = "info,contactcheck_cli=debug,contactcheck_eval=debug,contactcheck_config=debug";

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { VERBOSE_DIRECTIVES } else { "info" }))
}

/// Install the global subscriber. `RUST_LOG` overrides the level.
pub fn init(verbose: bool, log_file: Option<&Path>) -> Result<(), CliError> {
    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .with_filter(filter_fn(|meta| meta.target() != REPORT_TARGET));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .map_err(|e| CliError::io(format!("cannot create {}: {e}", dir.display())))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| CliError::io(format!("cannot open log {}: {e}", path.display())))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(console)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError {
            code: crate::exit_codes::EXIT_ERROR,
            message: format!("cannot install logger: {e}"),
            hint: None,
        })
}

/// Print report text to stdout and copy it into the run log.
pub fn emit_report(text: &str) {
    println!("{text}");
    tracing::info!(target: REPORT_TARGET, "{}", text);
}
