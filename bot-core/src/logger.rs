//! Tracing initialisation: the fmt layer writes to stderr (stdout belongs to the console network) and, when a path is given, to an append-only log file.

use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;

use tracing_subscriber::{
    fmt::format::FmtSpan, fmt::writer::MakeWriterExt, layer::SubscriberExt,
    util::SubscriberInitExt, EnvFilter, Registry,
};

/// Initialises the global tracing subscriber.
///
/// The level comes from `RUST_LOG` (e.g. `info`, `bot_engine=debug`) and defaults to `info`.
/// Load `.env` before calling this, otherwise `RUST_LOG` from the file is not seen.
pub fn init_tracing(log_file_path: Option<&str>) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = Registry::default().with(env_filter);

    match log_file_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let writer = io::stderr.and(Arc::new(file));
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_target(true)
                        .with_level(true),
                )
                .try_init()
        }
        None => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_target(true)
                    .with_level(true),
            )
            .try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}
