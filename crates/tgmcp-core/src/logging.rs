use std::{fs::OpenOptions, path::Path, sync::Arc};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::Result;

/// Initialize tracing for the server.
///
/// stdout carries JSON-RPC frames, so diagnostics go to stderr plus an
/// append-only log file. The error normalizer points users at that file.
/// Default level is `info`; override with `RUST_LOG`.
pub fn init(error_log_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(error_log_path)?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            fmt::layer()
                .with_writer(Arc::new(file))
                .with_target(false)
                .with_ansi(false),
        )
        .init();

    Ok(())
}
