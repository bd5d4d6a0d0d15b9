//! # Session Events and Commands
//!
//! ```text
//! input ──SessionCommand──▶ Session ──SessionEvent──▶ UI
//!          (tokio mpsc)                (crossbeam)
//! ```

use sandlink_shared::{ChatMessage, Client, PlayerLeaveReason};

use super::{CloseCause, SessionState};
use crate::protocol::{
    Cell, Coord, CursorPosition, CursorState, DebugInfo, GameInit, InteractiveOutput,
    PlaceCommand, ToolCommand,
};

/// Everything a session reports to the UI, in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// Lifecycle transition.
    StateChanged {
        /// Previous state.
        from: SessionState,
        /// New state.
        to: SessionState,
    },
    /// A client joined.
    ClientJoined(Client),
    /// A client left.
    ClientLeft {
        /// The departed client.
        client: Client,
        /// Why it left.
        reason: PlayerLeaveReason,
    },
    /// A client changed profile.
    ClientUpdated(Client),
    /// The roster was replaced (empty on a new identify).
    RosterReset(Vec<Client>),
    /// A chat message arrived or replaced one with the same id.
    ChatMessageAdded(ChatMessage),
    /// The chat history was replaced.
    ChatHistoryReset(Vec<ChatMessage>),
    /// A chat message was removed.
    ChatMessageDeleted(String),
    /// A world snapshot arrived.
    SnapshotUpdated {
        /// Simulation tick.
        tick: f64,
        /// Every non-empty cell.
        cells: Vec<Cell>,
        /// Live cursors.
        cursors: Vec<CursorPosition>,
    },
    /// Snapshot rate for the last window.
    TpsUpdated(u32),
    /// World parameters arrived.
    InitReceived(GameInit),
    /// Cell dump arrived.
    DebugInfo(DebugInfo),
    /// Console output arrived.
    InteractiveOutput(InteractiveOutput),
    /// The session ended. Emitted exactly once.
    Closed {
        /// What ended it.
        cause: CloseCause,
        /// Display template, `%0` marks the substitution.
        template: &'static str,
        /// Supplement for `%0`.
        substitution: Option<String>,
    },
}

impl SessionEvent {
    /// Variant name, for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "StateChanged",
            Self::ClientJoined(_) => "ClientJoined",
            Self::ClientLeft { .. } => "ClientLeft",
            Self::ClientUpdated(_) => "ClientUpdated",
            Self::RosterReset(_) => "RosterReset",
            Self::ChatMessageAdded(_) => "ChatMessageAdded",
            Self::ChatHistoryReset(_) => "ChatHistoryReset",
            Self::ChatMessageDeleted(_) => "ChatMessageDeleted",
            Self::SnapshotUpdated { .. } => "SnapshotUpdated",
            Self::TpsUpdated(_) => "TpsUpdated",
            Self::InitReceived(_) => "InitReceived",
            Self::DebugInfo(_) => "DebugInfo",
            Self::InteractiveOutput(_) => "InteractiveOutput",
            Self::Closed { .. } => "Closed",
        }
    }
}

/// User intents fed into a session.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionCommand {
    /// Place an element.
    Place(PlaceCommand),
    /// Use a tool.
    UseTool(ToolCommand),
    /// Clear cells.
    Delete(Vec<Coord>),
    /// Send a chat line.
    SendChat(String),
    /// Move the cursor.
    SetCursor(CursorState),
    /// Change own name and color.
    UpdateProfile {
        /// Display name.
        username: String,
        /// Color swatch or gradient.
        color: Vec<String>,
    },
    /// Ask for a cell dump.
    RequestDebug(Coord),
    /// Answer an interactive prompt.
    AnswerInput {
        /// Prompt being answered.
        from: String,
        /// Answer text.
        result: String,
    },
    /// Leave the session.
    Disconnect,
}

/// Bounded or unbounded crossbeam pair, built once and split between the
/// session and the UI. A render thread drains it without an async runtime.
#[derive(Debug)]
pub struct EventChannel<T> {
    sender: crossbeam_channel::Sender<T>,
    receiver: crossbeam_channel::Receiver<T>,
}

impl<T> EventChannel<T> {
    /// Holds at most `capacity` undelivered events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self { sender, receiver }
    }

    /// Never refuses an event.
    #[must_use]
    pub fn unbounded() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self { sender, receiver }
    }

    /// Producer end for the session, consumer end for the UI.
    #[must_use]
    pub fn split(self) -> (crossbeam_channel::Sender<T>, crossbeam_channel::Receiver<T>) {
        (self.sender, self.receiver)
    }
}
