//! # Network Protocol
//!
//! Tagged binary messages exchanged over one ordered duplex stream.
//!
//! ## Frame Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Kind (1 byte, 0-24)                                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Fields (strings, numbers, booleans, arrays, objects)         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The game-state snapshot embeds a second codec: the pixel stream, a run of
//! sparse cell records terminated by `0xFF`.
//!
//! ## Layers
//!
//! - [`buffer`] typed writes and cursor reads
//! - [`pixel`] sparse cell records and 7-bit strings
//! - [`commands`] place/tool/delete coordinate bodies
//! - [`packets`] / [`serialization`] the message union and its framing

pub mod buffer;
pub mod commands;
pub mod packets;
pub mod pixel;
pub mod serialization;

pub use buffer::{ByteReader, ByteWriter, Value};
pub use commands::{Coord, PlaceCommand, ToolCommand};
pub use packets::{
    CursorPosition, CursorState, DebugInfo, GameInit, GameState, InteractiveOutput, Packet,
};
pub use pixel::{decode_cells, encode_cells, Cell, CellProperty, Rgba};
pub use serialization::{PacketDeserializer, PacketSerializer, ProtocolManifest};
