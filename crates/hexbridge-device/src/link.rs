//! The device link: one TCP connection, reconnected until told to stop.
//!
//! A single worker task owns the socket. Everything else talks to it over a
//! command channel, and hears back through a [`ConnectionState`] channel:
//!
//! ```text
//! DeviceLink::set_level ──LinkCommand::Send──▶ LinkWorker ──[0x10, duty]──▶ device
//!        ▲                                         │
//!        └──────────── ResponseSlot ◀── ack ───────┘◀── "OK\0" / "ping"
//! ```

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::frame::{self, Ack};
use crate::slot::ResponseSlot;
use crate::{Backoff, ConnectionState, DeviceBridgeError, LinkConfig, level};

const COMMAND_CHANNEL_SIZE: usize = 8;

/// Receiving half of the link's connectivity notifications.
pub type StateReceiver = mpsc::UnboundedReceiver<ConnectionState>;

/// Commands sent from the handle to the worker.
enum LinkCommand {
    /// Write a frame. The reply reports only the write, not the ack.
    Send {
        frame: [u8; 2],
        reply: oneshot::Sender<Result<(), DeviceBridgeError>>,
    },
    /// Close the socket and end the worker.
    Stop,
}

struct Worker {
    commands: mpsc::Sender<LinkCommand>,
    task: JoinHandle<()>,
}

/// Handle to the device connection.
///
/// The socket itself never leaves the worker task. `set_level` must not be
/// awaited from inside that task; it is meant for the session controller.
pub struct DeviceLink {
    config: LinkConfig,
    states: mpsc::UnboundedSender<ConnectionState>,
    responses: Arc<ResponseSlot>,
    worker: Mutex<Option<Worker>>,
    /// Serializes requests so each ack pairs with its own frame.
    request: Mutex<()>,
}

impl DeviceLink {
    /// Creates a link that is not yet connecting.
    ///
    /// Call [`set_enable_connect(true)`](Self::set_enable_connect) to start
    /// the worker. The returned receiver yields every connectivity change.
    pub fn new(config: LinkConfig) -> (Self, StateReceiver) {
        let (states, rx) = mpsc::unbounded_channel();
        let link = Self {
            config,
            states,
            responses: Arc::new(ResponseSlot::new()),
            worker: Mutex::new(None),
            request: Mutex::new(()),
        };
        (link, rx)
    }

    /// Starts (`true`) or gracefully stops (`false`) the connect loop.
    ///
    /// Safe to call repeatedly with the same value.
    pub async fn set_enable_connect(&self, on: bool) {
        if !on {
            self.disconnect().await;
            return;
        }

        let mut worker = self.worker.lock().await;
        if worker.as_ref().is_some_and(|w| !w.task.is_finished()) {
            return;
        }

        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let link_worker = LinkWorker {
            backoff: Backoff::new(self.config.backoff.clone()),
            config: self.config.clone(),
            commands: rx,
            states: self.states.clone(),
            responses: Arc::clone(&self.responses),
        };
        let task = tokio::spawn(link_worker.run());
        *worker = Some(Worker { commands: tx, task });
    }

    /// Stops the worker and closes the socket, waiting until both are done.
    ///
    /// A no-op when already disconnected.
    pub async fn disconnect(&self) {
        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };
        // The worker may already be gone, then there is nothing to stop.
        let _ = worker.commands.send(LinkCommand::Stop).await;
        if let Err(e) = worker.task.await {
            warn!(error = %e, "device link worker ended abnormally");
        }
    }

    /// Sets the device level (0 = off, 10 = max) and waits for the ack.
    ///
    /// # Errors
    /// - [`DeviceBridgeError::NotConnected`] — no live socket
    /// - [`DeviceBridgeError::IoFailure`] — the write failed
    /// - [`DeviceBridgeError::Timeout`] — no ack within `response_timeout`
    /// - [`DeviceBridgeError::Interrupted`] — the worker stopped mid-request
    pub async fn set_level(&self, level: u8) -> Result<Ack, DeviceBridgeError> {
        let duty = level::to_duty_cycle(level);
        let commands = self
            .worker
            .lock()
            .await
            .as_ref()
            .map(|w| w.commands.clone())
            .ok_or(DeviceBridgeError::NotConnected)?;

        let _request = self.request.lock().await;
        if let Some(stale) = self.responses.clear().await {
            debug!(ack = %stale, "discarding stale device response");
        }

        debug!(level, duty, max = level::MAX_DUTY, "setting device level");
        let (reply_tx, reply_rx) = oneshot::channel();
        commands
            .send(LinkCommand::Send {
                frame: frame::encode_set_level(duty),
                reply: reply_tx,
            })
            .await
            .map_err(|_| DeviceBridgeError::NotConnected)?;
        reply_rx
            .await
            .map_err(|_| DeviceBridgeError::Interrupted)??;

        let wait = self.config.response_timeout();
        match self.responses.take(wait).await {
            Some(ack) => {
                debug!(level, %ack, "device acknowledged");
                Ok(ack)
            }
            None => Err(DeviceBridgeError::Timeout(wait)),
        }
    }

    /// Whether an acknowledgment is buffered and not yet consumed.
    pub fn has_pending_response(&self) -> bool {
        !self.responses.is_empty()
    }

    /// Whether the connect loop is currently running.
    pub async fn is_enabled(&self) -> bool {
        self.worker
            .lock()
            .await
            .as_ref()
            .is_some_and(|w| !w.task.is_finished())
    }

    /// The link configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

enum Opened {
    Stream(TcpStream),
    Failed(io::Error),
    Stopped,
}

enum Served {
    Stopped,
    Closed,
    Failed(io::Error),
}

/// Connect/receive loop. Sole owner of the socket.
struct LinkWorker {
    config: LinkConfig,
    commands: mpsc::Receiver<LinkCommand>,
    states: mpsc::UnboundedSender<ConnectionState>,
    responses: Arc<ResponseSlot>,
    backoff: Backoff,
}

impl LinkWorker {
    async fn run(mut self) {
        let addr = self.config.addr();
        info!(%addr, "device link worker started");

        loop {
            self.emit(ConnectionState::Connecting);
            let stream = match self.open().await {
                Opened::Stream(stream) => stream,
                Opened::Failed(e) => {
                    warn!(%addr, error = %e, "device connect failed");
                    self.emit(ConnectionState::Error);
                    if self.wait_backoff().await {
                        continue;
                    }
                    break;
                }
                Opened::Stopped => break,
            };

            self.backoff.reset();
            info!(%addr, "device link connected");
            self.emit(ConnectionState::Ready);

            match self.serve(stream).await {
                Served::Stopped => break,
                Served::Closed => {
                    info!(%addr, "device closed the connection");
                    if !self.wait_backoff().await {
                        break;
                    }
                }
                Served::Failed(e) => {
                    warn!(%addr, error = %e, "device link i/o error");
                    self.emit(ConnectionState::Error);
                    if !self.wait_backoff().await {
                        break;
                    }
                }
            }
        }

        self.emit(ConnectionState::Disconnected);
        info!(%addr, "device link worker stopped");
    }

    async fn open(&mut self) -> Opened {
        let connect = tokio::time::timeout(
            self.config.connect_timeout(),
            TcpStream::connect(self.config.addr()),
        );
        tokio::select! {
            result = connect => match result {
                Ok(Ok(stream)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        debug!(error = %e, "could not disable nagle");
                    }
                    Opened::Stream(stream)
                }
                Ok(Err(e)) => Opened::Failed(e),
                Err(_) => Opened::Failed(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "connect timed out",
                )),
            },
            () = self.reject_until_stop() => Opened::Stopped,
        }
    }

    /// Drives one connection until it closes, fails, or a stop arrives.
    async fn serve(&mut self, mut stream: TcpStream) -> Served {
        let mut buf = [0u8; frame::BUFFER_SIZE];
        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(LinkCommand::Send { frame, reply }) => {
                        trace!(?frame, "writing frame");
                        if let Err(e) = stream.write_all(&frame).await {
                            let _ = reply.send(Err(DeviceBridgeError::IoFailure(
                                io::Error::new(e.kind(), e.to_string()),
                            )));
                            return Served::Failed(e);
                        }
                        let _ = reply.send(Ok(()));
                    }
                    Some(LinkCommand::Stop) | None => {
                        if let Err(e) = stream.shutdown().await {
                            debug!(error = %e, "socket shutdown failed");
                        }
                        return Served::Stopped;
                    }
                },
                read = tokio::time::timeout(self.config.read_timeout(), stream.read(&mut buf)) => {
                    match read {
                        Err(_) => trace!("read idle, polling again"),
                        Ok(Ok(0)) => return Served::Closed,
                        Ok(Ok(n)) => {
                            if let Err(e) = self.handle_input(&mut stream, &buf[..n]).await {
                                return Served::Failed(e);
                            }
                        }
                        Ok(Err(e)) => return Served::Failed(e),
                    }
                }
            }
        }
    }

    /// Answers keepalives and hands everything else to the response slot.
    async fn handle_input(&self, stream: &mut TcpStream, chunk: &[u8]) -> io::Result<()> {
        let chunk = match frame::strip_ping(chunk) {
            Some(rest) => {
                trace!("keepalive ping");
                stream.write_all(frame::PONG).await?;
                if rest.is_empty() {
                    return Ok(());
                }
                rest
            }
            None => chunk,
        };

        let ack = Ack::decode(chunk);
        trace!(%ack, "device frame received");
        if !self.responses.offer(ack, self.config.offer_timeout()).await {
            warn!("response slot still occupied, dropping device frame");
        }
        Ok(())
    }

    /// Sleeps for the next backoff interval. Returns `false` if a stop
    /// arrived meanwhile.
    async fn wait_backoff(&mut self) -> bool {
        let wait = self.backoff.next();
        info!(
            wait_ms = wait.as_millis() as u64,
            attempt = self.backoff.attempt(),
            "waiting before reconnecting"
        );
        tokio::select! {
            () = tokio::time::sleep(wait) => true,
            () = self.reject_until_stop() => false,
        }
    }

    /// Answers requests with `NotConnected` until a stop arrives or every
    /// handle is gone.
    async fn reject_until_stop(&mut self) {
        while let Some(cmd) = self.commands.recv().await {
            match cmd {
                LinkCommand::Send { reply, .. } => {
                    let _ = reply.send(Err(DeviceBridgeError::NotConnected));
                }
                LinkCommand::Stop => return,
            }
        }
    }

    fn emit(&self, state: ConnectionState) {
        debug!(%state, "device connection state");
        // The receiver may be gone during shutdown.
        let _ = self.states.send(state);
    }
}
