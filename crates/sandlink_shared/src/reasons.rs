//! # Reason Tables
//!
//! Close and leave reasons are assigned by the server. Clients only map the
//! integer code to a display template; they never derive a code themselves.
//!
//! Templates carry at most one placeholder, `%0`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Placeholder substituted by the optional supplement.
pub const PLACEHOLDER: &str = "%0";

/// A template plus its optional substitution, handed to the UI as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReasonText {
    /// Display template.
    pub template: &'static str,
    /// Value for `%0`, if the server sent one.
    pub substitution: Option<String>,
}

impl ReasonText {
    /// Creates a reason text.
    #[must_use]
    pub fn new(template: &'static str, substitution: Option<String>) -> Self {
        Self { template, substitution }
    }

    /// Substitutes the placeholder. Without a substitution the placeholder and
    /// its adjoining space are dropped.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.substitution {
            Some(value) => self.template.replace(PLACEHOLDER, value),
            None => self
                .template
                .replace(" %0", "")
                .replace("%0 ", "")
                .replace(PLACEHOLDER, ""),
        }
    }
}

impl fmt::Display for ReasonText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Why the server closed a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisconnectReason {
    /// Connection dropped without a reason message.
    LostConnection,
    /// Kicked by a moderator.
    Kicked,
    /// Banned by a moderator.
    Banned,
    /// Server restart.
    Restarting,
    /// No free slot.
    ServerFull,
    /// Same account connected elsewhere.
    AlreadyConnected,
    /// Token rejected.
    Unauthorized,
    /// Heartbeats stopped.
    InactivityTimeout,
    /// Identity service failure.
    AuthError,
    /// Code not known to this client.
    Unknown(u32),
}

impl DisconnectReason {
    /// Every known reason, in code order.
    pub const KNOWN: [Self; 9] = [
        Self::LostConnection,
        Self::Kicked,
        Self::Banned,
        Self::Restarting,
        Self::ServerFull,
        Self::AlreadyConnected,
        Self::Unauthorized,
        Self::InactivityTimeout,
        Self::AuthError,
    ];

    /// Maps a wire code.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            3000 => Self::LostConnection,
            3001 => Self::Kicked,
            3002 => Self::Banned,
            3003 => Self::Restarting,
            3004 => Self::ServerFull,
            3005 => Self::AlreadyConnected,
            3006 => Self::Unauthorized,
            3007 => Self::InactivityTimeout,
            3008 => Self::AuthError,
            other => Self::Unknown(other),
        }
    }

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::LostConnection => 3000,
            Self::Kicked => 3001,
            Self::Banned => 3002,
            Self::Restarting => 3003,
            Self::ServerFull => 3004,
            Self::AlreadyConnected => 3005,
            Self::Unauthorized => 3006,
            Self::InactivityTimeout => 3007,
            Self::AuthError => 3008,
            Self::Unknown(code) => code,
        }
    }

    /// Display template.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::LostConnection => "Lost connection to the server.",
            Self::Kicked => "You have been kicked from the server. %0",
            Self::Banned => "You have been banned from the server. %0",
            Self::Restarting => "The server is restarting, please reconnect shortly.",
            Self::ServerFull => "Server is full, please try again later.",
            Self::AlreadyConnected => "You are already connected from another location.",
            Self::Unauthorized => "Unauthorized. %0",
            Self::InactivityTimeout => "Disconnected due to inactivity.",
            Self::AuthError => "Authentication failed. %0",
            Self::Unknown(_) => "Disconnected from the server. %0",
        }
    }

    /// Pairs the template with an optional supplement. Empty supplements count
    /// as absent.
    #[must_use]
    pub fn text(self, supplement: Option<&str>) -> ReasonText {
        let substitution = supplement.filter(|s| !s.is_empty()).map(str::to_owned);
        ReasonText::new(self.template(), substitution)
    }
}

/// Why a player left the roster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerLeaveReason {
    /// Left voluntarily.
    #[default]
    Left,
    /// Kicked.
    Kicked,
    /// Banned.
    Banned,
    /// Stopped answering heartbeats.
    TimedOut,
    /// Transport dropped.
    LostConnection,
}

impl PlayerLeaveReason {
    /// Maps a wire code. Unknown codes read as `Left`.
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Kicked,
            2 => Self::Banned,
            3 => Self::TimedOut,
            4 => Self::LostConnection,
            _ => Self::Left,
        }
    }

    /// Wire code.
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Display template; `%0` is the username.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Left => "%0 left the game",
            Self::Kicked => "%0 was kicked",
            Self::Banned => "%0 was banned",
            Self::TimedOut => "%0 timed out",
            Self::LostConnection => "%0 lost connection",
        }
    }

    /// Template with the username substituted.
    #[must_use]
    pub fn text(self, username: &str) -> ReasonText {
        let substitution = (!username.is_empty()).then(|| username.to_owned());
        ReasonText::new(self.template(), substitution)
    }
}
