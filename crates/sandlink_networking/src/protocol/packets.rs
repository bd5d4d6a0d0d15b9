//! # Packet Definitions
//!
//! Every message of the protocol, one variant per kind byte. Field layouts
//! live in [`super::serialization`].

use sandlink_shared::{ChatMessage, Client, ElementInfo, PacketKind, PlayerLeaveReason};

use super::buffer::Value;
use super::commands::{Coord, PlaceCommand, ToolCommand};
use super::pixel::Cell;

/// Remote cursor drawn over the world.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CursorPosition {
    /// Column.
    pub x: f64,
    /// Row.
    pub y: f64,
    /// Brush size.
    pub size: f64,
    /// Owning client id.
    pub player: String,
}

/// Per-tick world snapshot.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameState {
    /// Simulation tick.
    pub tick: f64,
    /// Every non-empty cell.
    pub cells: Vec<Cell>,
    /// Live cursors.
    pub cursors: Vec<CursorPosition>,
}

/// World parameters sent once after identify.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GameInit {
    /// Grid width in cells.
    pub width: f64,
    /// Grid height in cells.
    pub height: f64,
    /// Element catalog.
    pub elements: Vec<ElementInfo>,
    /// Server-side settings, opaque to the protocol.
    pub settings: Vec<(String, Value)>,
}

/// Local cursor state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CursorState {
    /// Hovered cell, `None` when outside the grid.
    pub position: Option<Coord>,
    /// Brush size.
    pub size: f64,
}

/// Full property dump of one cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DebugInfo {
    /// Column.
    pub x: f64,
    /// Row.
    pub y: f64,
    /// Element name.
    pub element: String,
    /// CSS color.
    pub color: String,
    /// Tick the cell was created.
    pub start: f64,
    /// Remaining properties.
    pub properties: Vec<(String, Value)>,
}

/// Interactive console output.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractiveOutput {
    /// Prompt / log source.
    pub target: String,
    /// Prompt or log text.
    pub text: String,
    /// `true` for a log line, `false` for a blocking prompt awaiting an answer.
    pub log: bool,
}

/// A decoded protocol message.
#[derive(Clone, Debug, PartialEq)]
pub enum Packet {
    /// Identify challenge.
    Identify {
        /// Connection id assigned by the server.
        connection_id: String,
    },
    /// Identify answer.
    IdentifyResponse {
        /// Token from the auth service.
        access_token: String,
    },
    /// A client joined.
    ClientJoin(Client),
    /// A client left.
    ClientLeave {
        /// The departed client.
        client: Client,
        /// Why it left.
        reason: PlayerLeaveReason,
    },
    /// Server keep-alive.
    ServerHeartbeat,
    /// Client keep-alive.
    ClientHeartbeat,
    /// A client changed profile.
    ClientUpdate(Client),
    /// Own profile change.
    ProfileUpdate {
        /// New display name.
        username: String,
        /// New color.
        color: Vec<String>,
    },
    /// World snapshot.
    GameState(GameState),
    /// Roster replacement.
    GamePlayers(Vec<Client>),
    /// Local cursor state.
    ClientState(CursorState),
    /// World parameters.
    GameInit(GameInit),
    /// One chat message.
    ChatMessage(ChatMessage),
    /// Outgoing chat text.
    ChatSend {
        /// Message text.
        content: String,
    },
    /// Placement.
    Place(PlaceCommand),
    /// Clear cells.
    Delete {
        /// Target cells.
        coords: Vec<Coord>,
    },
    /// Chat history replacement.
    ChatInit(Vec<ChatMessage>),
    /// Client leaving.
    Disconnect,
    /// Server closed the session.
    Closed {
        /// Reason code.
        code: u32,
        /// Optional free-text supplement.
        message: Option<String>,
    },
    /// Tool use.
    Tool(ToolCommand),
    /// Remove one chat message.
    ChatDelete {
        /// Message id.
        id: String,
    },
    /// Cell dump.
    DebugInspect(DebugInfo),
    /// Cell dump request.
    DebugRequest(Coord),
    /// Console output.
    InteractiveOutput(InteractiveOutput),
    /// Console answer.
    InteractiveInput {
        /// Prompt being answered.
        from: String,
        /// Answer text.
        result: String,
    },
}

impl Packet {
    /// Kind byte of this message.
    #[must_use]
    pub const fn kind(&self) -> PacketKind {
        match self {
            Self::Identify { .. } => PacketKind::SCIdentify,
            Self::IdentifyResponse { .. } => PacketKind::SSIdentify,
            Self::ClientJoin(_) => PacketKind::SCClientJoin,
            Self::ClientLeave { .. } => PacketKind::SCClientLeave,
            Self::ServerHeartbeat => PacketKind::SCHeartbeat,
            Self::ClientHeartbeat => PacketKind::SSHeartbeat,
            Self::ClientUpdate(_) => PacketKind::SCClientUpdate,
            Self::ProfileUpdate { .. } => PacketKind::SSClientUpdate,
            Self::GameState(_) => PacketKind::GCGameState,
            Self::GamePlayers(_) => PacketKind::GCGamePlayers,
            Self::ClientState(_) => PacketKind::GSClientState,
            Self::GameInit(_) => PacketKind::GCGameInit,
            Self::ChatMessage(_) => PacketKind::CCChatMessage,
            Self::ChatSend { .. } => PacketKind::CSChatMessage,
            Self::Place(_) => PacketKind::GSPlace,
            Self::Delete { .. } => PacketKind::GSDelete,
            Self::ChatInit(_) => PacketKind::CCChatInit,
            Self::Disconnect => PacketKind::SSDisconnect,
            Self::Closed { .. } => PacketKind::SCClosed,
            Self::Tool(_) => PacketKind::GSTool,
            Self::ChatDelete { .. } => PacketKind::CCChatDelete,
            Self::DebugInspect(_) => PacketKind::GCDebugInspect,
            Self::DebugRequest(_) => PacketKind::GSDebugRequest,
            Self::InteractiveOutput(_) => PacketKind::GCInteractiveOutput,
            Self::InteractiveInput { .. } => PacketKind::GSInteractiveInput,
        }
    }
}
