//! Error types for the session layer.

use hexbridge_device::DeviceBridgeError;

/// Invalid bridge configuration, reported before anything is started.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The device host is empty.
    #[error("device host must not be empty")]
    MissingHost,

    /// The device port is 0 or 65535.
    #[error("device port {0} is out of range")]
    InvalidPort(u16),

    /// The chat stop command is empty.
    #[error("stop command must not be empty")]
    EmptyStopCommand,
}

/// Errors returned by [`SessionHandle`](crate::SessionHandle) requests.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A request parameter is out of range, e.g. a level above 10 or an
    /// empty player name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Start requested while a round is active, or end requested while
    /// none is.
    #[error("illegal round state: {0}")]
    IllegalRoundState(String),

    /// The device rejected or never acknowledged a command.
    #[error(transparent)]
    Device(#[from] DeviceBridgeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The session actor is gone.
    #[error("session is unavailable")]
    Unavailable,
}
