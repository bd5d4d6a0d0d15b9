//! # Session Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! tps_window_ms = 1000
//! max_chat_history = 200
//! unknown_kind_policy = "disconnect"
//! credential = "session-cookie"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What to do with a frame that cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKindPolicy {
    /// Log and drop the frame.
    #[default]
    Ignore,
    /// Close the session as a protocol violation.
    Disconnect,
}

/// Session tuning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// TPS sampling window in milliseconds.
    pub tps_window_ms: u64,
    /// Bound of the UI event channel.
    pub event_channel_capacity: usize,
    /// Bound of the input command channel.
    pub command_channel_capacity: usize,
    /// Chat messages kept before the oldest is evicted.
    pub max_chat_history: usize,
    /// Undecodable-frame handling.
    pub unknown_kind_policy: UnknownKindPolicy,
    /// Credential handed to the auth provider during identify.
    pub credential: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tps_window_ms: sandlink_shared::TPS_WINDOW_MS,
            event_channel_capacity: 1024,
            command_channel_capacity: 64,
            max_chat_history: 500,
            unknown_kind_policy: UnknownKindPolicy::Ignore,
            credential: String::new(),
        }
    }
}

impl SessionConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Parse` on bad TOML and `Invalid` on zero capacities.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`SessionConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let nonzero = [
            ("tps_window_ms", self.tps_window_ms as usize),
            ("event_channel_capacity", self.event_channel_capacity),
            ("command_channel_capacity", self.command_channel_capacity),
            ("max_chat_history", self.max_chat_history),
        ];
        for (field, value) in nonzero {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{field} must be greater than zero")));
            }
        }
        Ok(())
    }

    /// TPS window as a duration.
    #[inline]
    #[must_use]
    pub const fn tps_window(&self) -> Duration {
        Duration::from_millis(self.tps_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(SessionConfig::from_toml_str("").unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_partial_document() {
        let config = SessionConfig::from_toml_str(
            "max_chat_history = 3\nunknown_kind_policy = \"disconnect\"\n",
        )
        .unwrap();
        assert_eq!(config.max_chat_history, 3);
        assert_eq!(config.unknown_kind_policy, UnknownKindPolicy::Disconnect);
        assert_eq!(config.tps_window(), Duration::from_millis(1000));
    }

    #[test]
    fn test_bad_policy_is_parse_error() {
        assert!(matches!(
            SessionConfig::from_toml_str("unknown_kind_policy = \"explode\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        assert!(matches!(
            SessionConfig::from_toml_str("event_channel_capacity = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SessionConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
