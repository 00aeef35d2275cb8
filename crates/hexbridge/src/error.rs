//! Unified error type for Hexbridge.

use std::path::PathBuf;

use hexbridge_device::DeviceBridgeError;
use hexbridge_session::{ConfigError, SessionError};

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` impls let `?` convert sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum HexbridgeError {
    /// A device request failed (not connected, i/o, timeout).
    #[error(transparent)]
    Device(#[from] DeviceBridgeError),

    /// A session request was rejected or the session is gone.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The bridge configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for a bridge config.
    #[error("cannot parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
