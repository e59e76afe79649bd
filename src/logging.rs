use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Sets up console plus rotating-file logging for the whole process.
///
/// Console output stays human-readable; the file layer writes JSON lines
/// under `logs/` with daily rotation so submission decisions can be audited
/// after the fact.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "giveaway.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stdout);

    // Respect RUST_LOG when set; default to info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clip_giveaway=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    // The guard flushes buffered log lines on drop; keep it alive for the
    // lifetime of the process
    std::mem::forget(guard);
}
