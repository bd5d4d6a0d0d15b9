//! # Session State Machine
//!
//! Sans-IO: the caller feeds frames and commands in, then drains outbound
//! frames. Events go straight to the UI channel.
//!
//! ## Message Acceptance
//!
//! | State                          | Processed                               |
//! |--------------------------------|-----------------------------------------|
//! | Connecting, AwaitingIdentify   | identify challenge                      |
//! | Identifying                    | roster, chat, heartbeat, closed, init   |
//! | Identified                     | the above + snapshot, debug, interactive|
//! | Closed                         | nothing                                 |
//!
//! Anything else is dropped with a trace log. A close reason received before
//! identify is held back and becomes the close cause when the transport
//! drops.

use std::collections::VecDeque;
use std::time::Instant;

use crossbeam_channel::{Sender, TrySendError};
use sandlink_shared::DisconnectReason;
use tracing::{debug, info, trace, warn};

use super::chat::{ChatHistory, ChatInsert};
use super::events::{SessionCommand, SessionEvent};
use super::roster::Roster;
use super::tps::TpsCounter;
use super::{CloseCause, Directive, SessionState};
use crate::config::{SessionConfig, UnknownKindPolicy};
use crate::error::{AuthError, DecodeError, EncodeResult};
use crate::protocol::{
    Coord, CursorState, GameInit, Packet, PacketDeserializer, PacketSerializer, PlaceCommand,
    ToolCommand,
};

/// One connection's lifecycle. Owns its roster and chat history.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    connection_id: Option<String>,
    roster: Roster,
    chat: ChatHistory,
    tps: TpsCounter,
    world: Option<GameInit>,
    last_cursor: Option<CursorState>,
    close_cause: Option<CloseCause>,
    pending_close: Option<CloseCause>,
    serializer: PacketSerializer,
    outbound: VecDeque<Vec<u8>>,
    events: Sender<SessionEvent>,
}

impl Session {
    /// Creates a session in `Connecting`.
    #[must_use]
    pub fn new(config: SessionConfig, events: Sender<SessionEvent>) -> Self {
        Self {
            roster: Roster::new(),
            chat: ChatHistory::new(config.max_chat_history),
            tps: TpsCounter::new(config.tps_window()),
            config,
            state: SessionState::Connecting,
            connection_id: None,
            world: None,
            last_cursor: None,
            close_cause: None,
            pending_close: None,
            serializer: PacketSerializer::new(),
            outbound: VecDeque::new(),
            events,
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true once closed.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Connection id from the last identify challenge.
    #[must_use]
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Connected players.
    #[must_use]
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Chat history.
    #[must_use]
    pub const fn chat(&self) -> &ChatHistory {
        &self.chat
    }

    /// World parameters, once initialized.
    #[must_use]
    pub const fn world(&self) -> Option<&GameInit> {
        self.world.as_ref()
    }

    /// Last reported snapshot rate.
    #[must_use]
    pub const fn tps(&self) -> u32 {
        self.tps.tps()
    }

    /// Why the session closed, once it has.
    #[must_use]
    pub const fn close_cause(&self) -> Option<&CloseCause> {
        self.close_cause.as_ref()
    }

    /// Returns true if frames are waiting to be sent.
    #[must_use]
    pub fn has_outbound(&self) -> bool {
        !self.outbound.is_empty()
    }

    /// Takes every queued outbound frame, oldest first.
    pub fn drain_outbound(&mut self) -> impl Iterator<Item = Vec<u8>> + '_ {
        self.outbound.drain(..)
    }

    // ========================================================================
    // TRANSPORT INPUT
    // ========================================================================

    /// The transport is open.
    pub fn transport_opened(&mut self) {
        if self.state == SessionState::Connecting {
            self.transition(SessionState::AwaitingIdentify);
        }
    }

    /// The transport is gone. Closes with the reason the server gave before
    /// identify if there was one, a lost-connection reason otherwise.
    pub fn transport_closed(&mut self) {
        let cause = self.pending_close.take().unwrap_or(CloseCause::TransportLost);
        self.close(cause);
    }

    /// Decodes and handles one inbound frame.
    pub fn handle_frame(&mut self, frame: &[u8], now: Instant) -> Option<Directive> {
        if self.is_closed() {
            trace!(len = frame.len(), "frame after close dropped");
            return None;
        }
        match PacketDeserializer::new(frame).deserialize() {
            Ok(Some(packet)) => self.handle_packet(packet, now),
            Ok(None) => {
                let kind = frame.first().copied().unwrap_or_default();
                self.reject_frame(DecodeError::UnknownPacketKind(kind));
                None
            }
            Err(err) => {
                self.reject_frame(err);
                None
            }
        }
    }

    fn reject_frame(&mut self, err: DecodeError) {
        match self.config.unknown_kind_policy {
            UnknownKindPolicy::Ignore => match err {
                DecodeError::UnknownPacketKind(kind) => trace!(kind, "unknown packet kind ignored"),
                err => warn!(error = %err, "dropping undecodable frame"),
            },
            UnknownKindPolicy::Disconnect => {
                warn!(error = %err, "protocol violation, closing session");
                self.close(CloseCause::ProtocolViolation(err));
            }
        }
    }

    /// Handles one decoded message.
    pub fn handle_packet(&mut self, packet: Packet, now: Instant) -> Option<Directive> {
        let kind = packet.kind();
        match (self.state, packet) {
            (SessionState::Closed, _) => {
                trace!(kind = kind.name(), "message after close dropped");
            }
            (
                SessionState::Connecting | SessionState::AwaitingIdentify,
                Packet::Identify { connection_id },
            ) => return Some(self.begin_identify(connection_id)),
            (
                SessionState::Connecting | SessionState::AwaitingIdentify,
                Packet::Closed { code, message },
            ) => {
                debug!(code, ?message, "close reason before identify held");
                self.pending_close = Some(CloseCause::Server {
                    reason: DisconnectReason::from_code(code),
                    message,
                });
            }
            (SessionState::Connecting | SessionState::AwaitingIdentify, _) => {
                trace!(kind = kind.name(), "message before identify ignored");
            }
            (_, Packet::ServerHeartbeat) => {
                trace!("heartbeat");
                self.queue_or_warn(&Packet::ClientHeartbeat);
            }
            (_, Packet::ClientJoin(client)) => {
                debug!(id = %client.id, username = %client.username, "client joined");
                self.roster.upsert(client.clone());
                self.emit(SessionEvent::ClientJoined(client));
            }
            (_, Packet::ClientLeave { client, reason }) => {
                debug!(id = %client.id, ?reason, "client left");
                let client = self.roster.remove(&client.id).unwrap_or(client);
                self.emit(SessionEvent::ClientLeft { client, reason });
            }
            (_, Packet::ClientUpdate(client)) => {
                self.roster.upsert(client.clone());
                self.emit(SessionEvent::ClientUpdated(client));
            }
            (_, Packet::GamePlayers(clients)) => {
                self.roster.reset(clients);
                self.emit(SessionEvent::RosterReset(self.roster.to_vec()));
            }
            (_, Packet::ChatMessage(message)) => {
                match self.chat.push(message.clone()) {
                    ChatInsert::Appended { evicted: Some(old) } => {
                        trace!(id = %old.id, "chat history full, evicted oldest");
                    }
                    ChatInsert::Replaced(_) => trace!(id = %message.id, "chat message replaced"),
                    ChatInsert::Appended { evicted: None } => {}
                }
                self.emit(SessionEvent::ChatMessageAdded(message));
            }
            (_, Packet::ChatInit(messages)) => {
                self.chat.reset(messages);
                self.emit(SessionEvent::ChatHistoryReset(self.chat.to_vec()));
            }
            (_, Packet::ChatDelete { id }) => {
                if self.chat.delete(&id).is_some() {
                    self.emit(SessionEvent::ChatMessageDeleted(id));
                } else {
                    trace!(%id, "delete for unknown chat message");
                }
            }
            (_, Packet::Closed { code, message }) => {
                info!(code, ?message, "server closed session");
                self.close(CloseCause::Server {
                    reason: DisconnectReason::from_code(code),
                    message,
                });
            }
            (state, Packet::GameInit(init)) => {
                info!(width = init.width, height = init.height, elements = init.elements.len(), "world init");
                self.world = Some(init.clone());
                self.emit(SessionEvent::InitReceived(init));
                if state == SessionState::Identifying {
                    self.transition(SessionState::Identified);
                }
            }
            (SessionState::Identified, Packet::GameState(snapshot)) => {
                self.emit(SessionEvent::SnapshotUpdated {
                    tick: snapshot.tick,
                    cells: snapshot.cells,
                    cursors: snapshot.cursors,
                });
                if let Some(tps) = self.tps.record(now) {
                    self.emit(SessionEvent::TpsUpdated(tps));
                }
            }
            (SessionState::Identified, Packet::DebugInspect(info)) => {
                self.emit(SessionEvent::DebugInfo(info));
            }
            (SessionState::Identified, Packet::InteractiveOutput(output)) => {
                self.emit(SessionEvent::InteractiveOutput(output));
            }
            (state, _) => {
                trace!(kind = kind.name(), ?state, "message ignored");
            }
        }
        None
    }

    fn begin_identify(&mut self, connection_id: String) -> Directive {
        info!(%connection_id, "identify challenge");
        self.connection_id = Some(connection_id.clone());
        self.roster.clear();
        self.emit(SessionEvent::RosterReset(Vec::new()));
        self.transition(SessionState::Identifying);
        Directive::FetchToken { connection_id }
    }

    /// Finishes the identify handshake with the auth provider's answer.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be encoded.
    pub fn complete_identify(&mut self, token: Result<String, AuthError>) -> EncodeResult<()> {
        if self.state != SessionState::Identifying {
            debug!(state = ?self.state, "late identify answer dropped");
            return Ok(());
        }
        match token {
            Ok(access_token) => self.queue(&Packet::IdentifyResponse { access_token }),
            Err(err) => {
                warn!(error = %err, "identify failed");
                self.close(CloseCause::AuthFailed(err));
                Ok(())
            }
        }
    }

    // ========================================================================
    // COMMANDS
    // ========================================================================

    /// Runs one input command. Returns `Ok(false)` if it was dropped.
    ///
    /// # Errors
    ///
    /// Returns the construction error; nothing is queued.
    pub fn execute(&mut self, command: SessionCommand) -> EncodeResult<bool> {
        match command {
            SessionCommand::Place(command) => self.place(command),
            SessionCommand::UseTool(command) => self.use_tool(command),
            SessionCommand::Delete(coords) => self.delete(coords),
            SessionCommand::SendChat(content) => self.send_chat(content),
            SessionCommand::SetCursor(cursor) => self.set_cursor(cursor),
            SessionCommand::UpdateProfile { username, color } => {
                self.update_profile(username, color)
            }
            SessionCommand::RequestDebug(coord) => self.request_debug(coord),
            SessionCommand::AnswerInput { from, result } => self.answer_input(from, result),
            SessionCommand::Disconnect => Ok(self.disconnect()),
        }
    }

    /// Places an element.
    ///
    /// # Errors
    ///
    /// Returns `ArrayTooLong` over 65535 coordinates.
    pub fn place(&mut self, command: PlaceCommand) -> EncodeResult<bool> {
        self.send_gated(&Packet::Place(command))
    }

    /// Uses a tool.
    ///
    /// # Errors
    ///
    /// Returns `ArrayTooLong` over 65535 coordinates.
    pub fn use_tool(&mut self, command: ToolCommand) -> EncodeResult<bool> {
        self.send_gated(&Packet::Tool(command))
    }

    /// Clears cells.
    ///
    /// # Errors
    ///
    /// Returns `ArrayTooLong` over 65535 coordinates.
    pub fn delete(&mut self, coords: Vec<Coord>) -> EncodeResult<bool> {
        self.send_gated(&Packet::Delete { coords })
    }

    /// Sends a chat line.
    ///
    /// # Errors
    ///
    /// Returns `StringTooLong` for absurd input.
    pub fn send_chat(&mut self, content: String) -> EncodeResult<bool> {
        self.send_gated(&Packet::ChatSend { content })
    }

    /// Reports the cursor. Sends only when it differs from the last one sent.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept for symmetry with the other commands.
    pub fn set_cursor(&mut self, cursor: CursorState) -> EncodeResult<bool> {
        if self.last_cursor == Some(cursor) {
            return Ok(false);
        }
        let sent = self.send_gated(&Packet::ClientState(cursor))?;
        if sent {
            self.last_cursor = Some(cursor);
        }
        Ok(sent)
    }

    /// Changes own name and color.
    ///
    /// # Errors
    ///
    /// Returns `ArrayTooLong` for more than 65535 colors.
    pub fn update_profile(&mut self, username: String, color: Vec<String>) -> EncodeResult<bool> {
        self.send_gated(&Packet::ProfileUpdate { username, color })
    }

    /// Requests a cell dump.
    ///
    /// # Errors
    ///
    /// Infallible in practice.
    pub fn request_debug(&mut self, coord: Coord) -> EncodeResult<bool> {
        self.send_gated(&Packet::DebugRequest(coord))
    }

    /// Answers an interactive prompt.
    ///
    /// # Errors
    ///
    /// Returns `StringTooLong` for absurd input.
    pub fn answer_input(&mut self, from: String, result: String) -> EncodeResult<bool> {
        self.send_gated(&Packet::InteractiveInput { from, result })
    }

    /// Leaves the session. Returns false if it was already closed.
    pub fn disconnect(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        if self.state != SessionState::Connecting {
            self.queue_or_warn(&Packet::Disconnect);
        }
        self.close(CloseCause::LocalDisconnect);
        true
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn send_gated(&mut self, packet: &Packet) -> EncodeResult<bool> {
        if self.state != SessionState::Identified {
            debug!(kind = packet.kind().name(), state = ?self.state, "command dropped before identify");
            return Ok(false);
        }
        self.queue(packet)?;
        Ok(true)
    }

    fn queue(&mut self, packet: &Packet) -> EncodeResult<()> {
        let frame = self.serializer.serialize(packet)?.to_vec();
        trace!(kind = packet.kind().name(), len = frame.len(), "queued");
        self.outbound.push_back(frame);
        Ok(())
    }

    fn queue_or_warn(&mut self, packet: &Packet) {
        if let Err(err) = self.queue(packet) {
            warn!(kind = packet.kind().name(), error = %err, "could not encode");
        }
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        info!(?from, ?to, "session state");
        self.state = to;
        self.emit(SessionEvent::StateChanged { from, to });
    }

    fn close(&mut self, cause: CloseCause) {
        if self.is_closed() {
            return;
        }
        let text = cause.text();
        info!(?cause, reason = %text, "session closed");
        self.transition(SessionState::Closed);
        self.close_cause = Some(cause.clone());
        self.emit(SessionEvent::Closed {
            cause,
            template: text.template,
            substitution: text.substitution,
        });
    }

    fn emit(&self, event: SessionEvent) {
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(event = event.name(), "event channel full, event dropped");
            }
            Err(TrySendError::Disconnected(event)) => {
                trace!(event = event.name(), "no event listener");
            }
        }
    }
}
