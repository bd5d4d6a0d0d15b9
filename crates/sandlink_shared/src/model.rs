//! Records exchanged between client and server.
//!
//! Numeric fields are `f64` because every number on the wire is an 8-byte
//! double; keeping them as-is makes decode(encode(x)) exact.

use serde::{Deserialize, Serialize};

use crate::protocol::ChatMessageType;

/// A connected player as seen in the roster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Server-assigned connection id (roster key).
    pub id: String,
    /// Display name.
    pub username: String,
    /// Join timestamp (ms since epoch).
    pub joined_at: f64,
    /// One swatch, or the stops of a gradient.
    #[serde(default)]
    pub color: Vec<String>,
}

impl Client {
    /// Primary swatch, falling back to white.
    #[must_use]
    pub fn primary_color(&self) -> &str {
        self.color.first().map_or("#ffffff", String::as_str)
    }

    /// Returns true if the color is a gradient.
    #[must_use]
    pub fn is_gradient(&self) -> bool {
        self.color.len() > 1
    }
}

/// One chat line. Immutable once received; removed only by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Unique id within the session history.
    pub id: String,
    /// Timestamp (ms since epoch).
    pub created_at: f64,
    /// Author client id.
    pub author: String,
    /// Author display name at send time.
    pub author_username: String,
    /// Author color at send time.
    #[serde(default)]
    pub author_color: Vec<String>,
    /// Message text.
    pub content: String,
    /// Category.
    #[serde(default)]
    pub message_type: ChatMessageType,
    /// Author permission level.
    #[serde(default)]
    pub permission_level: f64,
    /// Leave reason code for `Leave` messages, 0 otherwise.
    #[serde(default)]
    pub reason: f64,
}

/// Entry of the element catalog sent at init.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementInfo {
    /// Element name (placement key).
    pub name: String,
    /// Menu category.
    pub category: String,
    /// Tools act on cells instead of placing.
    #[serde(default)]
    pub is_tool: bool,
    /// Render button text dark.
    #[serde(default)]
    pub dark_text: bool,
    /// Button swatch or gradient.
    #[serde(default)]
    pub color: Vec<String>,
}
