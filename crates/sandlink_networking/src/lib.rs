//! # SANDLINK Networking
//!
//! Multiplayer synchronization layer for a falling-sand world.
//!
//! ## Architecture
//!
//! - **Protocol**: tagged big-endian binary messages, one kind byte each
//! - **Pixel stream**: sparse per-cell property records inside snapshots
//! - **Session**: identify handshake, heartbeats, roster, chat, close reasons
//! - **Driver**: tokio loop around a session, a transport and an auth provider
//!
//! ## Flow
//!
//! ```text
//! CLIENT                                   SERVER
//!   |<-- SCIdentify(connection id) ----------|
//!   |    (auth provider → token)             |
//!   |--- SSIdentify(token) ----------------->|
//!   |<-- GCGameInit / GCGamePlayers ---------|
//!   |<-- GCGameState (every tick) -----------|
//!   |--- GSPlace / GSTool / CSChatMessage -->|
//!   |<-- SCClosed(reason) -------------------|
//! ```
//!
//! The server is the source of truth: the client only draws what it is sent
//! and forwards intents.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sandlink_networking::{ChannelTransport, SessionConfig, SessionDriver, StaticAuth};
//!
//! let (client_end, server_end) = ChannelTransport::pair(64);
//! let (driver, handle) = SessionDriver::new(
//!     SessionConfig::default(),
//!     client_end,
//!     StaticAuth::new("cookie", "token"),
//! );
//! let cause = driver.run().await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod auth;
pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use auth::{AuthProvider, StaticAuth};
pub use config::{SessionConfig, UnknownKindPolicy};
pub use error::{
    AuthError, ConfigError, DecodeError, DecodeResult, EncodeError, EncodeResult, SessionError,
    TransportError,
};
pub use protocol::{
    ByteReader, ByteWriter, Cell, Coord, CursorState, GameInit, GameState, Packet,
    PacketDeserializer, PacketSerializer, PlaceCommand, ToolCommand, Value,
};
pub use session::{
    CloseCause, Directive, Session, SessionCommand, SessionDriver, SessionEvent, SessionHandle,
    SessionState,
};
pub use transport::{ChannelTransport, Transport, TransportStats};
