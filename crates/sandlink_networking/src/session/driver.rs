//! # Session Driver
//!
//! Runs one [`Session`] on tokio.
//!
//! ```text
//!            ┌──────────── SessionDriver ────────────┐
//! transport ─┤ recv ─▶ Session ─▶ outbound ─▶ send   ├─ transport
//! commands  ─┤          │  ▲                         │
//!            │  events ◀┘  └─ auth (identify only)   │
//!            └───────────────────────────────────────┘
//! ```
//!
//! Inputs are handled strictly one at a time. While the auth provider is
//! fetching a token the transport is not read, so the identify answer is
//! always the next thing sent after the challenge.

use std::time::Instant;

use crossbeam_channel::Receiver;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::events::{EventChannel, SessionCommand, SessionEvent};
use super::machine::Session;
use super::{CloseCause, Directive};
use crate::auth::AuthProvider;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::transport::Transport;

/// Caller's end of a running session.
#[derive(Debug)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    events: Receiver<SessionEvent>,
}

impl SessionHandle {
    /// Queues a command. Returns false once the driver has stopped.
    pub async fn send(&self, command: SessionCommand) -> bool {
        self.commands.send(command).await.is_ok()
    }

    /// Command sender, for handing to an input thread.
    #[must_use]
    pub fn commands(&self) -> mpsc::Sender<SessionCommand> {
        self.commands.clone()
    }

    /// UI event stream.
    #[must_use]
    pub const fn events(&self) -> &Receiver<SessionEvent> {
        &self.events
    }
}

enum Step {
    Frame(Option<Vec<u8>>),
    Command(Option<SessionCommand>),
}

/// Async wrapper wiring transport, auth and channels around a [`Session`].
#[derive(Debug)]
pub struct SessionDriver<T, A> {
    session: Session,
    transport: T,
    auth: A,
    commands: mpsc::Receiver<SessionCommand>,
    credential: String,
}

impl<T, A> SessionDriver<T, A>
where
    T: Transport + Send,
    A: AuthProvider + Sync,
{
    /// Builds a driver and the handle used to talk to it.
    #[must_use]
    pub fn new(config: SessionConfig, transport: T, auth: A) -> (Self, SessionHandle) {
        let (event_tx, event_rx) = EventChannel::new(config.event_channel_capacity).split();
        let (command_tx, command_rx) = mpsc::channel(config.command_channel_capacity.max(1));
        let credential = config.credential.clone();
        let driver = Self {
            session: Session::new(config, event_tx),
            transport,
            auth,
            commands: command_rx,
            credential,
        };
        let handle = SessionHandle {
            commands: command_tx,
            events: event_rx,
        };
        (driver, handle)
    }

    /// The session being driven.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Runs until the session closes, then closes the transport.
    ///
    /// # Errors
    ///
    /// Returns an error only if the identify answer cannot be encoded.
    pub async fn run(mut self) -> Result<CloseCause, SessionError> {
        info!("session driver started");
        self.session.transport_opened();
        let result = self.drive().await;
        self.transport.close().await;
        match &result {
            Ok(cause) => info!(?cause, "session driver stopped"),
            Err(err) => warn!(error = %err, "session driver failed"),
        }
        result
    }

    async fn drive(&mut self) -> Result<CloseCause, SessionError> {
        let mut commands_open = true;
        loop {
            self.flush().await;
            if let Some(cause) = self.session.close_cause() {
                return Ok(cause.clone());
            }

            let step = tokio::select! {
                frame = self.transport.recv() => Step::Frame(frame),
                command = self.commands.recv(), if commands_open => Step::Command(command),
            };

            match step {
                Step::Frame(Some(frame)) => {
                    if let Some(Directive::FetchToken { connection_id }) =
                        self.session.handle_frame(&frame, Instant::now())
                    {
                        debug!(%connection_id, "fetching access token");
                        let token = self.auth.access_token(&self.credential).await;
                        self.session.complete_identify(token)?;
                    }
                }
                Step::Frame(None) => self.session.transport_closed(),
                Step::Command(Some(command)) => {
                    if let Err(err) = self.session.execute(command) {
                        warn!(error = %err, "command rejected");
                    }
                }
                Step::Command(None) => {
                    debug!("command channel closed");
                    commands_open = false;
                }
            }
        }
    }

    async fn flush(&mut self) {
        let frames: Vec<Vec<u8>> = self.session.drain_outbound().collect();
        for frame in frames {
            if self.transport.send(frame).await.is_err() {
                warn!("send failed, transport lost");
                self.session.transport_closed();
                return;
            }
        }
    }
}
