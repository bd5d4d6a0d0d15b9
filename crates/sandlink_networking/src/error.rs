//! # Networking Error Types
//!
//! All errors that can occur while encoding, decoding, configuring or driving
//! a session.

use std::path::PathBuf;

use thiserror::Error;

/// Construction errors. Raised at encode time, before any byte is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// Array field over the 2-byte count limit.
    #[error("array too long: {len} elements, limit {max}")]
    ArrayTooLong {
        /// Elements supplied.
        len: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// String over the 4-byte length limit.
    #[error("string too long: {0} bytes")]
    StringTooLong(usize),

    /// Raw buffer over the 4-byte length limit.
    #[error("buffer too long: {0} bytes")]
    BufferTooLong(usize),

    /// Character outside the 7-bit cell string alphabet.
    #[error("character {0:?} cannot be packed into a cell string")]
    UnpackableChar(char),
}

/// Per-message decode failures. Fatal to one message, never to the session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Buffer exhausted before the expected field.
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes, {remaining} left")]
    UnexpectedEof {
        /// Cursor position when the read started.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes that were left.
        remaining: usize,
    },

    /// String field is not UTF-8.
    #[error("invalid utf-8 in string at offset {0}")]
    InvalidUtf8(usize),

    /// Array or object element carries an unknown type tag.
    #[error("unknown value tag {0}")]
    UnknownValueTag(u8),

    /// Array element has a different type than the field requires.
    #[error("expected {expected} value, found {found}")]
    UnexpectedValueKind {
        /// Required kind.
        expected: &'static str,
        /// Kind on the wire.
        found: &'static str,
    },

    /// Kind byte outside the message table.
    #[error("unknown packet kind {0}")]
    UnknownPacketKind(u8),

    /// Cell stream names a property outside the table.
    #[error("unknown cell property id {0}")]
    UnknownCellProperty(u8),

    /// A framed element's declared length disagrees with its encoding.
    #[error("length mismatch: declared {declared}, expected {expected}")]
    LengthMismatch {
        /// Length on the wire.
        declared: usize,
        /// Length the type needs.
        expected: usize,
    },
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// File could not be read.
    #[error("cannot read config {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// TOML syntax or type error.
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but make no sense together.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Transport failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Remote end is gone.
    #[error("transport closed")]
    Closed,
}

/// Auth collaborator failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The identity service refused the credential.
    #[error("credential rejected: {0}")]
    Rejected(String),

    /// The identity service could not be reached.
    #[error("auth service unavailable: {0}")]
    Unavailable(String),
}

/// Errors that end a session driver.
///
/// Transport loss is not one of them: it closes the session normally with
/// a lost-connection reason.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The identify answer could not be encoded.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Result type for encode operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Result type for decode operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
