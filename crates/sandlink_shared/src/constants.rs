//! # Protocol Constants
//!
//! Values both ends of the wire must agree on.
//!
//! **CRITICAL:** Changing any of these breaks every deployed client.

// =============================================================================
// FRAMING
// =============================================================================

/// Maximum element count of any array field (2-byte count prefix).
pub const MAX_ARRAY_LEN: usize = u16::MAX as usize;

/// Canonical encoding of `true` for 1-byte booleans.
///
/// Decoders treat every other byte as `false`.
pub const BOOL_TRUE: u8 = 0xFF;

/// Highest message kind in this protocol generation.
pub const MAX_PACKET_KIND: u8 = 24;

// =============================================================================
// CELL STREAM
// =============================================================================

/// Explicit end-of-record tag in the cell stream.
pub const CELL_END_OF_RECORD: u8 = 0xFF;

// =============================================================================
// SESSION
// =============================================================================

/// Wall-clock window for the snapshots-per-second counter.
pub const TPS_WINDOW_MS: u64 = 1000;
