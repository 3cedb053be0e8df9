//! Logging and tracing initialization.
//!
//! The log level is controlled via the `RUST_LOG` environment variable:
//!
//! ```bash
//! RUST_LOG=debug cargo run
//! RUST_LOG=custodia=debug,tower_http=debug,sqlx=warn cargo run
//! ```

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with sensible defaults.
///
/// Call once at application startup, before creating the `App`. Defaults
/// to `info` when `RUST_LOG` is unset.
///
/// # Panics
///
/// Panics if called more than once.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize JSON-formatted logging (recommended for production log
/// aggregation).
///
/// # Panics
///
/// Panics if called more than once.
pub fn init_logging_json() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
