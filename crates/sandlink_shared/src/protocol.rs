//! Message kinds shared between client and server.
//!
//! Naming: first letter is the subsystem (`S`ession, `G`ame, `C`hat), second
//! letter the receiver (`C`lient, `S`erver).

use serde::{Deserialize, Serialize};

/// One-byte message discriminator.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    /// Server asks the client to identify (carries the connection id).
    SCIdentify = 0,
    /// Client answers the challenge with an access token.
    SSIdentify = 1,
    /// A client joined.
    SCClientJoin = 2,
    /// A client left.
    SCClientLeave = 3,
    /// Server keep-alive.
    SCHeartbeat = 4,
    /// Client keep-alive answer.
    SSHeartbeat = 5,
    /// A client changed its profile.
    SCClientUpdate = 6,
    /// Client changes its own profile.
    SSClientUpdate = 7,
    /// Per-tick world snapshot.
    GCGameState = 8,
    /// Full roster, sent once after identify.
    GCGamePlayers = 9,
    /// Client cursor state.
    GSClientState = 10,
    /// World dimensions, element catalog and settings.
    GCGameInit = 11,
    /// One chat message.
    CCChatMessage = 12,
    /// Client sends chat text.
    CSChatMessage = 13,
    /// Place an element over a set of cells.
    GSPlace = 14,
    /// Clear a set of cells.
    GSDelete = 15,
    /// Chat history, sent once after identify.
    CCChatInit = 16,
    /// Client is leaving.
    SSDisconnect = 17,
    /// Server closed the session with a reason code.
    SCClosed = 18,
    /// Invoke a tool on a set of cells.
    GSTool = 19,
    /// Remove one chat message by id.
    CCChatDelete = 20,
    /// Full property dump of one cell.
    GCDebugInspect = 21,
    /// Client asks for a cell dump.
    GSDebugRequest = 22,
    /// Server output for the interactive console (log line or blocking prompt).
    GCInteractiveOutput = 23,
    /// Client answer to a blocking prompt.
    GSInteractiveInput = 24,
}

impl PacketKind {
    /// Every kind, in tag order.
    pub const ALL: [Self; 25] = [
        Self::SCIdentify,
        Self::SSIdentify,
        Self::SCClientJoin,
        Self::SCClientLeave,
        Self::SCHeartbeat,
        Self::SSHeartbeat,
        Self::SCClientUpdate,
        Self::SSClientUpdate,
        Self::GCGameState,
        Self::GCGamePlayers,
        Self::GSClientState,
        Self::GCGameInit,
        Self::CCChatMessage,
        Self::CSChatMessage,
        Self::GSPlace,
        Self::GSDelete,
        Self::CCChatInit,
        Self::SSDisconnect,
        Self::SCClosed,
        Self::GSTool,
        Self::CCChatDelete,
        Self::GCDebugInspect,
        Self::GSDebugRequest,
        Self::GCInteractiveOutput,
        Self::GSInteractiveInput,
    ];

    /// Converts from the wire byte. Unknown bytes yield `None`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        if (value as usize) < Self::ALL.len() {
            Some(Self::ALL[value as usize])
        } else {
            None
        }
    }

    /// Wire byte.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Stable name used in logs and the kind table.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SCIdentify => "SCIdentify",
            Self::SSIdentify => "SSIdentify",
            Self::SCClientJoin => "SCClientJoin",
            Self::SCClientLeave => "SCClientLeave",
            Self::SCHeartbeat => "SCHeartbeat",
            Self::SSHeartbeat => "SSHeartbeat",
            Self::SCClientUpdate => "SCClientUpdate",
            Self::SSClientUpdate => "SSClientUpdate",
            Self::GCGameState => "GCGameState",
            Self::GCGamePlayers => "GCGamePlayers",
            Self::GSClientState => "GSClientState",
            Self::GCGameInit => "GCGameInit",
            Self::CCChatMessage => "CCChatMessage",
            Self::CSChatMessage => "CSChatMessage",
            Self::GSPlace => "GSPlace",
            Self::GSDelete => "GSDelete",
            Self::CCChatInit => "CCChatInit",
            Self::SSDisconnect => "SSDisconnect",
            Self::SCClosed => "SCClosed",
            Self::GSTool => "GSTool",
            Self::CCChatDelete => "CCChatDelete",
            Self::GCDebugInspect => "GCDebugInspect",
            Self::GSDebugRequest => "GSDebugRequest",
            Self::GCInteractiveOutput => "GCInteractiveOutput",
            Self::GSInteractiveInput => "GSInteractiveInput",
        }
    }

    /// Returns true if the server is the sender of this kind.
    #[must_use]
    pub const fn is_server_to_client(self) -> bool {
        matches!(
            self,
            Self::SCIdentify
                | Self::SCClientJoin
                | Self::SCClientLeave
                | Self::SCHeartbeat
                | Self::SCClientUpdate
                | Self::GCGameState
                | Self::GCGamePlayers
                | Self::GCGameInit
                | Self::CCChatMessage
                | Self::CCChatInit
                | Self::SCClosed
                | Self::CCChatDelete
                | Self::GCDebugInspect
                | Self::GCInteractiveOutput
        )
    }
}

/// Chat message category.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatMessageType {
    /// Server notice.
    System = 0,
    /// Join notice.
    Join = 1,
    /// Leave notice.
    Leave = 2,
    /// Regular player message.
    #[default]
    Message = 3,
    /// Bridged from the Discord channel.
    Discord = 4,
}

impl ChatMessageType {
    /// Converts from the wire value. Unknown values map to `System`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Join,
            2 => Self::Leave,
            3 => Self::Message,
            4 => Self::Discord,
            _ => Self::System,
        }
    }
}
