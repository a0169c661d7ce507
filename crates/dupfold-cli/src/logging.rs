use std::ffi::OsStr;
use std::path::Path;

use dupfold_core::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Set up tracing for the CLI.
///
/// Console logs go to stderr in compact form, so stdout stays reserved for
/// the similarity report. Filtering follows `RUST_LOG`, defaulting to
/// `info`. When the config sets `log_file`, a plain-text copy of the log
/// stream is written there through a non-blocking appender; the returned
/// guard flushes it on exit.
pub fn init_logger(config: &AppConfig) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let registry = tracing_subscriber::registry().with(filter).with(console);

    match config.log_file.as_deref() {
        Some(log_file) => {
            let path = Path::new(log_file);
            let dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            let name = path
                .file_name()
                .unwrap_or_else(|| OsStr::new("dupfold.log"));

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            registry
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .init();
            Some(guard)
        }
        None => {
            registry.init();
            None
        }
    }
}
