//! Error types for the device layer.

/// Errors returned by an explicit device request such as
/// [`DeviceLink::set_level`](crate::DeviceLink::set_level).
///
/// Failures inside the connect/receive loop never show up here. The worker
/// recovers from them locally and reports them as
/// [`ConnectionState::Error`](crate::ConnectionState::Error) notifications.
#[derive(Debug, thiserror::Error)]
pub enum DeviceBridgeError {
    /// No socket is live, or the link worker is not running.
    #[error("device is not connected")]
    NotConnected,

    /// Writing the command frame to the socket failed.
    #[error("device i/o failed: {0}")]
    IoFailure(#[source] std::io::Error),

    /// The device did not acknowledge the command in time.
    #[error("device did not respond within {0:?}")]
    Timeout(std::time::Duration),

    /// The link worker stopped while the request was in flight.
    #[error("device request interrupted")]
    Interrupted,
}
