use std::fs::OpenOptions;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable naming an append-only debug log file.
pub const LOG_FILE_ENV: &str = "CLIPFEED_LOG_FILE";

pub fn init_tracing() {
    init_tracing_with_default("info");
}

/// Install the global subscriber: a stderr layer filtered by `RUST_LOG`
/// (falling back to `default_filter`) and, when `CLIPFEED_LOG_FILE` is set,
/// a DEBUG file layer. Calling it twice is harmless.
pub fn init_tracing_with_default(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter);

    let registry = tracing_subscriber::registry().with(stderr_layer);

    let file = std::env::var(LOG_FILE_ENV).ok().and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some((path, file)),
            Err(err) => {
                eprintln!("Could not open log file {}: {}", path, err);
                None
            }
        }
    });

    let result = match file {
        Some((path, file)) => {
            let file_layer = fmt::layer()
                .with_writer(file)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);
            let result = registry.with(file_layer).try_init();
            if result.is_ok() {
                eprintln!("File logging enabled: {}", path);
            }
            result
        }
        None => registry.try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
