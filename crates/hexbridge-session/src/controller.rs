//! Session controller: the actor that owns the running round.
//!
//! Requests and game-timer ticks are handled one at a time by a single
//! Tokio task, which also consumes the link's state reports. The round
//! state has exactly one writer. Callers talk to it through a cloneable
//! [`SessionHandle`].

use hexbridge_device::level::NUM_LEVELS;
use hexbridge_device::{ConnectionState, DeviceLink, StateReceiver};
use hexbridge_tick::{TickInfo, Ticker};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::state::{StateTracker, TickOutcome};
use crate::{
    BridgeConfig, EventSink, GameConfig, GameSession, SessionError, SessionEvent, SessionState,
};

/// Capacity of the request channel. Senders wait when it is full.
const COMMAND_BUFFER: usize = 32;

type Reply<T> = oneshot::Sender<Result<T, SessionError>>;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub(crate) enum SessionCommand {
    StartRound {
        player: String,
        game_time: Option<i32>,
        level: Option<u8>,
        reply: Reply<()>,
    },
    ChangeRound {
        level: Option<u8>,
        player: Option<String>,
        game_time: Option<i32>,
        reply: Reply<()>,
    },
    EndRound {
        abort: bool,
        reply: Reply<()>,
    },
    ChatMessage {
        sender: String,
        text: String,
    },
    GetInfo {
        reply: oneshot::Sender<SessionInfo>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Snapshot returned by [`SessionHandle::info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Last published session state.
    pub state: SessionState,
    /// The active round, if any.
    pub round: Option<GameSession>,
}

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// Handle to a running session actor. Cheap to clone.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Starts a round for `player`.
    ///
    /// `game_time` of `None` or ≤ 0 and `level` of `None` fall back to the
    /// configured defaults.
    pub async fn start_round(
        &self,
        player: impl Into<String>,
        game_time: Option<i32>,
        level: Option<u8>,
    ) -> Result<(), SessionError> {
        let player = player.into();
        self.request(|reply| SessionCommand::StartRound {
            player,
            game_time,
            level,
            reply,
        })
        .await?
    }

    /// Adjusts the running round. `level` is applied to the device right
    /// away, even without a round.
    pub async fn change_round(
        &self,
        level: Option<u8>,
        player: Option<String>,
        game_time: Option<i32>,
    ) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::ChangeRound {
            level,
            player,
            game_time,
            reply,
        })
        .await?
    }

    /// Ends the active round. With `abort` no end announcement is made.
    pub async fn end_round(&self, abort: bool) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::EndRound { abort, reply })
            .await?
    }

    /// Delivers a chat line (fire-and-forget).
    pub async fn chat_message(
        &self,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.sender
            .send(SessionCommand::ChatMessage {
                sender: sender.into(),
                text: text.into(),
            })
            .await
            .map_err(|_| SessionError::Unavailable)
    }

    /// Snapshot of the published state and the active round, if any.
    pub async fn info(&self) -> Result<SessionInfo, SessionError> {
        self.request(|reply| SessionCommand::GetInfo { reply }).await
    }

    /// Aborts a running round and disconnects the device, then stops the
    /// actor. Returns once the actor is done.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(build(reply_tx))
            .await
            .map_err(|_| SessionError::Unavailable)?;
        reply_rx.await.map_err(|_| SessionError::Unavailable)
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// The session actor. Runs inside its own Tokio task.
pub struct SessionController<S: EventSink> {
    config: GameConfig,
    link: DeviceLink,
    link_states: StateReceiver,
    sink: S,
    round: GameSession,
    tracker: StateTracker,
    ticker: Ticker,
    commands: mpsc::Receiver<SessionCommand>,
}

impl<S: EventSink> SessionController<S> {
    /// Validates `config`, spawns the actor, and returns its handle.
    ///
    /// The actor enables the device link as soon as it runs. Must be called
    /// from within a Tokio runtime.
    pub fn spawn(config: BridgeConfig, sink: S) -> Result<SessionHandle, SessionError> {
        config.validate()?;
        let BridgeConfig { link, game } = config;

        let (link, link_states) = DeviceLink::new(link);
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);

        let actor = Self {
            ticker: Ticker::with_period(game.tick_interval()),
            config: game,
            link,
            link_states,
            sink,
            round: GameSession::idle(),
            tracker: StateTracker::new(),
            commands: rx,
        };
        tokio::spawn(actor.run());

        Ok(SessionHandle { sender: tx })
    }

    async fn run(mut self) {
        info!(addr = %self.link.config().addr(), "session started");
        self.link.set_enable_connect(true).await;

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle(cmd).await {
                            break;
                        }
                    }
                    None => {
                        debug!("all session handles dropped");
                        self.shutdown().await;
                        break;
                    }
                },
                Some(state) = self.link_states.recv() => self.on_link_state(state),
                tick = self.ticker.wait_for_tick(), if self.ticker.is_running() => {
                    self.on_tick(tick).await;
                    self.ticker.record_tick_end();
                }
            }
        }

        info!("session stopped");
    }

    /// Returns `false` once the actor has to stop.
    async fn handle(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::StartRound {
                player,
                game_time,
                level,
                reply,
            } => {
                let result = self.start_round(player, game_time, level).await;
                let _ = reply.send(result);
            }
            SessionCommand::ChangeRound {
                level,
                player,
                game_time,
                reply,
            } => {
                let result = self.change_round(level, player, game_time).await;
                let _ = reply.send(result);
            }
            SessionCommand::EndRound { abort, reply } => {
                let result = self.end_request(abort).await;
                let _ = reply.send(result);
            }
            SessionCommand::ChatMessage { sender, text } => {
                self.chat_message(&sender, &text).await;
            }
            SessionCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            SessionCommand::Shutdown { reply } => {
                self.shutdown().await;
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    // ----- Requests -----

    async fn start_round(
        &mut self,
        player: String,
        game_time: Option<i32>,
        level: Option<u8>,
    ) -> Result<(), SessionError> {
        if self.round.is_active() {
            self.notice("A round is already active.");
            return Err(SessionError::IllegalRoundState(
                "a round is already active".into(),
            ));
        }
        let player = player.trim().to_owned();
        if player.is_empty() {
            self.notice("Cannot start a round without a player name.");
            return Err(SessionError::InvalidArgument(
                "player name is empty".into(),
            ));
        }
        let level = match level {
            Some(level) => level,
            None => self.config.effective_default_level(),
        };
        if level > NUM_LEVELS {
            self.notice(format!("Invalid level: {level}"));
            return Err(SessionError::InvalidArgument(format!(
                "level {level} is above {NUM_LEVELS}"
            )));
        }
        let game_time = game_time
            .filter(|secs| *secs > 0)
            .map(i64::from)
            .unwrap_or_else(|| i64::from(self.config.default_game_time_secs));

        self.round = GameSession::start(player.clone(), game_time, level);
        if let Err(e) = self.link.set_level(level).await {
            warn!(%player, level, error = %e, "could not start round");
            self.round.clear();
            self.notice(format!("Could not start the round: {e}"));
            return Err(e.into());
        }

        self.publish(SessionState::GameActive);
        let line = self.config.templates.render_start(
            &player,
            &self.config.stop_command,
            game_time,
        );
        self.announce(line);
        self.ticker.start();
        info!(%player, level, game_time, "round started");
        Ok(())
    }

    async fn change_round(
        &mut self,
        level: Option<u8>,
        player: Option<String>,
        game_time: Option<i32>,
    ) -> Result<(), SessionError> {
        if let Some(level) = level {
            if level > NUM_LEVELS {
                self.notice(format!("Invalid level: {level}"));
                return Err(SessionError::InvalidArgument(format!(
                    "level {level} is above {NUM_LEVELS}"
                )));
            }
            if let Err(e) = self.link.set_level(level).await {
                warn!(level, error = %e, "could not change level");
                self.notice(format!("Could not set level: {e}"));
                return Err(e.into());
            }
            self.round.level = level;
        }
        if let Some(player) = player.map(|p| p.trim().to_owned()).filter(|p| !p.is_empty()) {
            self.round.player = player;
        }
        if let Some(secs) = game_time.filter(|secs| *secs > 0) {
            if self.round.is_active() {
                self.round.remaining_secs = i64::from(secs);
            }
        }

        let level_text = level.map_or_else(|| "unchanged".to_owned(), |l| l.to_string());
        self.notice(format!(
            "Changed parameters: level={}, player={}, gameTime={}",
            level_text, self.round.player, self.round.remaining_secs
        ));
        info!(
            level = ?level,
            player = %self.round.player,
            remaining = self.round.remaining_secs,
            "round changed"
        );
        Ok(())
    }

    async fn end_request(&mut self, abort: bool) -> Result<(), SessionError> {
        if !self.round.is_active() {
            self.notice("No round is active.");
            return Err(SessionError::IllegalRoundState(
                "no round is active".into(),
            ));
        }
        if abort {
            self.abort_round().await;
        } else {
            self.end_round().await;
        }
        Ok(())
    }

    async fn chat_message(&mut self, sender: &str, text: &str) {
        if !self.round.is_active() {
            return;
        }
        if sender.to_lowercase() != self.round.player.to_lowercase() {
            return;
        }
        if !text
            .to_lowercase()
            .starts_with(&self.config.stop_command.to_lowercase())
        {
            return;
        }
        info!(%sender, "stop command received");
        self.end_round().await;
        self.notice(format!("Round ended by {sender}"));
    }

    fn info(&self) -> SessionInfo {
        SessionInfo {
            state: self.tracker.current(),
            round: self.round.is_active().then(|| self.round.clone()),
        }
    }

    // ----- Round lifecycle -----

    async fn on_tick(&mut self, tick: TickInfo) {
        let outcome = self.round.tick();
        debug!(
            tick = tick.tick,
            behind = tick.behind,
            remaining = self.round.remaining_secs,
            "game tick"
        );
        match outcome {
            TickOutcome::Nothing => {}
            TickOutcome::Announce(secs) => {
                let line = self.config.templates.render_announce(secs);
                self.announce(line);
            }
            TickOutcome::AnnounceShort(secs) => {
                let line = self.config.templates.render_short_announce(secs);
                self.announce(line);
            }
            TickOutcome::Expired => {
                info!("round time elapsed");
                self.end_round().await;
            }
        }
    }

    /// Stops the round without an announcement. Cleanup always runs.
    async fn abort_round(&mut self) {
        // No tick may fire once the device has been told to stop.
        self.ticker.stop();
        let result = self.link.set_level(0).await;
        self.round.clear();
        self.tracker.round_cleared();
        match result {
            Ok(_) => self.publish(SessionState::Ready),
            Err(e) => {
                warn!(error = %e, "could not turn the device off");
                self.publish(SessionState::Error);
            }
        }
        info!("round stopped");
    }

    async fn end_round(&mut self) {
        self.abort_round().await;
        let line = self.config.templates.render_end();
        self.announce(line);
    }

    async fn shutdown(&mut self) {
        if self.round.is_active() {
            self.abort_round().await;
        }
        self.ticker.stop();
        self.link.disconnect().await;
        self.publish(SessionState::Disconnected);
    }

    // ----- Notifications -----

    fn on_link_state(&mut self, state: ConnectionState) {
        let published = self.tracker.on_link_state(state);
        debug!(link = %state, %published, "link state changed");
        self.sink.emit(SessionEvent::State(published));
    }

    fn publish(&mut self, state: SessionState) {
        let published = self.tracker.fold(state);
        self.sink.emit(SessionEvent::State(published));
    }

    fn announce(&self, line: String) {
        debug!(%line, "announcement");
        self.sink.emit(SessionEvent::Announcement(line));
    }

    fn notice(&self, text: impl Into<String>) {
        self.sink.emit(SessionEvent::Notice(text.into()));
    }
}
