//! Link configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::BackoffConfig;

/// Connection settings for a [`DeviceLink`](crate::DeviceLink).
///
/// Validation of `host` and `port` happens where the whole bridge
/// configuration is checked, before a link is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Device hostname or IP address.
    pub host: String,

    /// Device TCP port.
    pub port: u16,

    /// How long a single connect attempt may take, in milliseconds.
    pub connect_timeout_ms: u64,

    /// How long a read may block before the loop wakes up again, in
    /// milliseconds. A timeout here is not an error.
    pub read_timeout_ms: u64,

    /// How long `set_level` waits for the device acknowledgment, in
    /// milliseconds.
    pub response_timeout_ms: u64,

    /// How long the worker waits for the response slot to free up before
    /// dropping a frame, in milliseconds.
    pub offer_timeout_ms: u64,

    /// Reconnect backoff.
    pub backoff: BackoffConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            connect_timeout_ms: 5_000,
            read_timeout_ms: 3_000,
            response_timeout_ms: 5_000,
            offer_timeout_ms: 1_000,
            backoff: BackoffConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Config for `host:port` with default timeouts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// `host:port`, for logs.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn offer_timeout(&self) -> Duration {
        Duration::from_millis(self.offer_timeout_ms)
    }
}
