//! Request-scoped entities for a single "member joined channel" event.

use serde::{Deserialize, Serialize};

/// Visibility of the channel a member joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    /// Public channel (`"C"` on the wire).
    Public,
    /// Private channel or group (any other wire value).
    Private,
}

impl ChannelType {
    /// Map Slack's `channel_type` code onto a [`ChannelType`].
    ///
    /// Only `"C"` denotes a public channel; every other code, including an
    /// absent one, is treated as private.
    #[must_use]
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("C") => Self::Public,
            _ => Self::Private,
        }
    }

    /// Whether the channel is private.
    #[must_use]
    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

/// A user joined a channel somewhere in the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEvent {
    /// Channel that was joined.
    pub channel_id: String,
    /// Visibility of that channel.
    pub channel_type: ChannelType,
    /// User who joined.
    pub user_id: String,
    /// Slack's `event_id`, when the envelope carried one.
    pub event_id: Option<String>,
}

impl MembershipEvent {
    /// Build an event without an upstream event id.
    #[must_use]
    pub fn new(
        channel_id: impl Into<String>,
        channel_type: ChannelType,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            channel_type,
            user_id: user_id.into(),
            event_id: None,
        }
    }
}

/// Resolved channel identity; `channel_name` is the whitelist key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    /// Channel identifier.
    pub channel_id: String,
    /// Channel name without the leading `#`.
    pub channel_name: String,
}

/// Resolved user identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// User identifier.
    pub user_id: String,
    /// Workspace handle compared against the whitelist.
    pub user_name: String,
    /// Automated accounts are always admitted.
    pub is_bot: bool,
}
