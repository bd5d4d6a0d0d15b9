//! # Session
//!
//! Lifecycle of one connection, from transport open to close.
//!
//! ## State Machine
//!
//! ```text
//! ┌────────────┐ transport open ┌──────────────────┐
//! │ Connecting ├───────────────▶│ AwaitingIdentify │
//! └─────┬──────┘                └────────┬─────────┘
//!       │        identify challenge      │
//!       └──────────────┬─────────────────┘
//!                      ▼
//!              ┌──────────────┐  game init  ┌────────────┐
//!              │ Identifying  ├────────────▶│ Identified │
//!              └──────┬───────┘             └─────┬──────┘
//!                     │  closed / lost / leave    │
//!                     └────────────┬──────────────┘
//!                                  ▼
//!                            ┌──────────┐
//!                            │  Closed  │
//!                            └──────────┘
//! ```
//!
//! [`Session`] is the sans-IO core: frames in, frames and events out.
//! [`SessionDriver`] runs it on tokio against a [`Transport`](crate::transport::Transport)
//! and an [`AuthProvider`](crate::auth::AuthProvider).

mod chat;
mod driver;
mod events;
mod machine;
mod roster;
mod tps;

pub use chat::{ChatHistory, ChatInsert};
pub use driver::{SessionDriver, SessionHandle};
pub use events::{EventChannel, SessionCommand, SessionEvent};
pub use machine::Session;
pub use roster::Roster;
pub use tps::TpsCounter;

use sandlink_shared::{DisconnectReason, ReasonText};

use crate::error::{AuthError, DecodeError};

/// Lifecycle state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Transport not yet open.
    #[default]
    Connecting,
    /// Transport open, waiting for the identify challenge.
    AwaitingIdentify,
    /// Challenge received, token being fetched and sent.
    Identifying,
    /// World info received; commands are accepted.
    Identified,
    /// Terminal.
    Closed,
}

/// Work the session needs from outside before it can continue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Fetch an access token and hand it to [`Session::complete_identify`].
    FetchToken {
        /// Connection id from the challenge.
        connection_id: String,
    },
}

/// Why a session closed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CloseCause {
    /// The server sent a close message.
    Server {
        /// Reason code, carried through verbatim.
        reason: DisconnectReason,
        /// Free-text supplement.
        message: Option<String>,
    },
    /// The transport went away without a close message.
    TransportLost,
    /// The local user left.
    LocalDisconnect,
    /// No access token could be obtained.
    AuthFailed(AuthError),
    /// A frame could not be decoded under the strict policy.
    ProtocolViolation(DecodeError),
}

/// Template shown when the local user leaves.
pub const LOCAL_DISCONNECT_TEMPLATE: &str = "You left the server.";

/// Template shown on a strict-policy decode failure.
pub const PROTOCOL_VIOLATION_TEMPLATE: &str = "Protocol error. %0";

impl CloseCause {
    /// Display text for the UI.
    #[must_use]
    pub fn text(&self) -> ReasonText {
        match self {
            Self::Server { reason, message } => reason.text(message.as_deref()),
            Self::TransportLost => DisconnectReason::LostConnection.text(None),
            Self::LocalDisconnect => ReasonText::new(LOCAL_DISCONNECT_TEMPLATE, None),
            Self::AuthFailed(err) => DisconnectReason::AuthError.text(Some(&err.to_string())),
            Self::ProtocolViolation(err) => {
                ReasonText::new(PROTOCOL_VIOLATION_TEMPLATE, Some(err.to_string()))
            }
        }
    }
}
