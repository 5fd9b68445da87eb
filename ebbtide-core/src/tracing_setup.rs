//! Tracing setup for Ebbtide
//!
//! Console-only subscriber: the embedding application decides where logs
//! go beyond stdout. `RUST_LOG` overrides the default level when set.

use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize tracing with console output at the given default level.
///
/// `RUST_LOG` takes precedence over `default_level` when present, so
/// operators can raise verbosity per-module without code changes.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - If a global subscriber is already installed
pub fn init_tracing(default_level: Level) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .try_init()?;

    tracing::info!("Tracing initialized: level={}", default_level);

    Ok(())
}
