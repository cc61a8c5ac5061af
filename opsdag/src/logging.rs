// src/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. explicit `level` argument (if provided)
//! 2. `OPSDAG_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`

use anyhow::Result;
use tracing_subscriber::fmt;

/// Initialise the global logging subscriber.
///
/// Safe to call once at startup; a second call panics, so this belongs in
/// binaries and examples, not in library code paths.
pub fn init_logging(level: Option<tracing::Level>) -> Result<()> {
    // `tracing::Level` already parses the five level names; it is
    // case-sensitive, so normalise before handing off.
    let level = level.or_else(|| {
        std::env::var("OPSDAG_LOG")
            .ok()
            .and_then(|s| s.trim().to_lowercase().parse().ok())
    });

    fmt()
        .with_max_level(level.unwrap_or(tracing::Level::INFO))
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}
