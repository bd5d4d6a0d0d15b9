//! # SANDLINK Shared
//!
//! Common types used by both client and server.
//!
//! ## RULE
//!
//! This crate describes *what* travels over the wire, never *how*:
//! - message kinds and their directions
//! - client, chat and element records
//! - close / leave reason tables with their display templates
//!
//! Byte layouts belong to `sandlink_networking::protocol`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod model;
pub mod protocol;
pub mod reasons;

pub use constants::{
    BOOL_TRUE, CELL_END_OF_RECORD, MAX_ARRAY_LEN, MAX_PACKET_KIND, TPS_WINDOW_MS,
};
pub use model::{ChatMessage, Client, ElementInfo};
pub use protocol::{ChatMessageType, PacketKind};
pub use reasons::{DisconnectReason, PlayerLeaveReason, ReasonText};
