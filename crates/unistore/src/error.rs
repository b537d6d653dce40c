//! Error types for the store

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the store and its configuration layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// A reducer dispatched into its own store before returning.
    ///
    /// This is a programming error. The store never returns it as a value;
    /// it panics with this message instead.
    #[error("reentrant dispatch on store `{store}`: reducers must not dispatch actions")]
    ReentrantDispatch { store: String },

    #[error("Failed to read store config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse store config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
