//! Logging setup for the keytree core
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is the embedding application's call. This module offers a default setup
//! for binaries and tests that do not bring their own.

use tracing_subscriber::EnvFilter;

/// Subscriber options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Emit debug-level events for this crate
    pub debug_enabled: bool,
    /// Include thread ids and names in output
    pub include_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug_enabled: false,
            include_thread_info: false,
        }
    }
}

/// Install a fmt subscriber honoring `RUST_LOG`, falling back to the level
/// the config selects. Safe to call more than once; later calls keep the
/// subscriber already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let fallback = if config.debug_enabled {
        "keytree_core=debug"
    } else {
        "keytree_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(config.include_thread_info)
        .with_thread_names(config.include_thread_info)
        .try_init();

    Ok(())
}
