//! Stderr logging using env_logger
//!
//! `RUST_LOG` selects the level; without it the demo logs at debug so the
//! store's action log is visible.

use log::LevelFilter;

/// Initialize logging, returns the active level
pub fn init() -> LevelFilter {
    let level = std::env::var("RUST_LOG")
        .map(|v| match v.to_lowercase().as_str() {
            "error" => LevelFilter::Error,
            "warn" => LevelFilter::Warn,
            "info" => LevelFilter::Info,
            "debug" => LevelFilter::Debug,
            "trace" => LevelFilter::Trace,
            _ => LevelFilter::Info,
        })
        .unwrap_or(LevelFilter::Debug);

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .init();

    level
}
