use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes logging with console output plus a JSON daily-rolling file
/// under `logs/`.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    // Non-blocking appender with daily rotation
    let file_appender = tracing_appender::rolling::daily("logs", "harvest.log");
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("kuyy_scraper=info".parse().unwrap()))
        .with(file_layer)
        .with(console_layer)
        .init();

    // The guard must outlive the process for logs to keep flushing
    std::mem::forget(_guard);
}
