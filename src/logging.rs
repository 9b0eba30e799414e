use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_DIRECTIVE: &str = "courseware_api=info";

/// Initializes the logging system with both console and file output.
///
/// The file layer writes JSON lines to `{log_dir}/{file_prefix}.log.YYYY-MM-DD`.
/// `RUST_LOG` overrides the default `courseware_api=info` filter. Keep the
/// returned guard alive until exit so buffered lines get flushed.
pub fn init_logging(log_dir: &Path, file_prefix: &str) -> WorkerGuard {
    if let Err(e) = fs::create_dir_all(log_dir) {
        eprintln!("cannot create log dir {}: {}", log_dir.display(), e);
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, format!("{file_prefix}.log"));
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // a second init (tests, repeated CLI runs in-process) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init();

    guard
}
