//! `Hexbridge` builder and handle.
//!
//! Ties the layers together: configuration → session actor → device link.

use std::path::Path;

use hexbridge_device::LinkConfig;
use hexbridge_session::{
    BridgeConfig, EventSink, GameConfig, SessionController, SessionEvent, SessionHandle,
    SessionInfo,
};
use tokio::sync::mpsc;

use crate::HexbridgeError;

/// Reads a [`BridgeConfig`] from a JSON file. Missing fields take their
/// defaults. The result is not validated yet.
pub fn load_config(path: impl AsRef<Path>) -> Result<BridgeConfig, HexbridgeError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| HexbridgeError::ConfigRead {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| HexbridgeError::ConfigParse {
        path: path.to_owned(),
        source,
    })
}

/// Builder for configuring and starting a bridge.
///
/// # Example
///
/// ```rust,ignore
/// use hexbridge::prelude::*;
///
/// let (bridge, mut events) = Hexbridge::builder()
///     .device("10.0.0.5", 4242)
///     .start_with_channel()?;
/// bridge.start_round("alice", Some(30), None).await?;
/// ```
pub struct HexbridgeBuilder {
    config: BridgeConfig,
}

impl HexbridgeBuilder {
    /// Creates a builder with default settings and no device address.
    pub fn new() -> Self {
        Self {
            config: BridgeConfig::default(),
        }
    }

    /// Sets the device address, keeping the other link settings.
    pub fn device(mut self, host: impl Into<String>, port: u16) -> Self {
        self.config.link.host = host.into();
        self.config.link.port = port;
        self
    }

    pub fn link_config(mut self, link: LinkConfig) -> Self {
        self.config.link = link;
        self
    }

    pub fn game_config(mut self, game: GameConfig) -> Self {
        self.config.game = game;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the whole configuration with the contents of a JSON file.
    pub fn config_file(self, path: impl AsRef<Path>) -> Result<Self, HexbridgeError> {
        Ok(self.config(load_config(path)?))
    }

    /// Validates the configuration and starts the session actor, which
    /// connects to the device in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self, sink: impl EventSink) -> Result<Hexbridge, HexbridgeError> {
        self.config.validate()?;
        let addr = self.config.link.addr();
        let session = SessionController::spawn(self.config, sink)?;
        tracing::info!(%addr, "hexbridge started");
        Ok(Hexbridge { session })
    }

    /// Same as [`start`](Self::start), delivering events to a channel.
    pub fn start_with_channel(
        self,
    ) -> Result<(Hexbridge, mpsc::UnboundedReceiver<SessionEvent>), HexbridgeError> {
        let (tx, rx) = mpsc::unbounded_channel();
        Ok((self.start(tx)?, rx))
    }
}

impl Default for HexbridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running bridge. Cheap to clone.
#[derive(Clone)]
pub struct Hexbridge {
    session: SessionHandle,
}

impl Hexbridge {
    /// Creates a new builder.
    pub fn builder() -> HexbridgeBuilder {
        HexbridgeBuilder::new()
    }

    /// The underlying session handle.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub async fn start_round(
        &self,
        player: impl Into<String>,
        game_time: Option<i32>,
        level: Option<u8>,
    ) -> Result<(), HexbridgeError> {
        Ok(self.session.start_round(player, game_time, level).await?)
    }

    pub async fn change_round(
        &self,
        level: Option<u8>,
        player: Option<String>,
        game_time: Option<i32>,
    ) -> Result<(), HexbridgeError> {
        Ok(self.session.change_round(level, player, game_time).await?)
    }

    pub async fn end_round(&self, abort: bool) -> Result<(), HexbridgeError> {
        Ok(self.session.end_round(abort).await?)
    }

    pub async fn chat_message(
        &self,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), HexbridgeError> {
        Ok(self.session.chat_message(sender, text).await?)
    }

    pub async fn info(&self) -> Result<SessionInfo, HexbridgeError> {
        Ok(self.session.info().await?)
    }

    /// Turns the device off, disconnects, and stops the session.
    pub async fn shutdown(&self) -> Result<(), HexbridgeError> {
        Ok(self.session.shutdown().await?)
    }
}
