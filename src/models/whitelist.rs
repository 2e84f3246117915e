//! Whitelist snapshot: channel name to the ordered set of allowed user names.
//!
//! The stored form is a JSON object such as
//! `{"general": ["alice", "carol"], "ops": ["dave"]}`. A channel that is not
//! a key of the object is unrestricted; `{}` therefore opens every channel.
//!
//! Entries are checked when they are looked up. A channel whose value is not
//! a list of user names fails only joins to that channel, and the raw value
//! is written back untouched when the document is edited.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{EventError, EventResult};

/// Value stored under one channel key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum ChannelEntry {
    Users(Vec<String>),
    Invalid(serde_json::Value),
}

/// One fetched whitelist document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Whitelist {
    channels: BTreeMap<String, ChannelEntry>,
}

impl Whitelist {
    /// Empty whitelist: no channel is governed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored document.
    ///
    /// A blank document or JSON `null` yields `Ok(None)` (document absent).
    /// Channel values are not checked here; see [`Whitelist::allowed_users`]
    /// and [`Whitelist::validate`].
    ///
    /// # Errors
    ///
    /// Returns `EventError::Configuration` when the document is not valid
    /// JSON or not an object.
    pub fn from_document(raw: &str) -> EventResult<Option<Self>> {
        if raw.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Option<Self>>(raw)
            .map_err(|err| EventError::Configuration(format!("malformed whitelist document: {err}")))
    }

    /// Serialize to the stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` if serialization fails.
    pub fn to_document(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Check every channel entry.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Configuration` naming the first channel whose
    /// value is not an array of strings.
    pub fn validate(&self) -> EventResult<()> {
        match self
            .channels
            .iter()
            .find(|(_, entry)| matches!(entry, ChannelEntry::Invalid(_)))
        {
            Some((name, _)) => Err(invalid_entry(name)),
            None => Ok(()),
        }
    }

    /// Whether membership of `channel_name` is restricted.
    #[must_use]
    pub fn is_governed(&self, channel_name: &str) -> bool {
        self.channels.contains_key(channel_name)
    }

    /// Allowed user names for a governed channel, `None` when unrestricted.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Configuration` when the channel's value is not an
    /// array of strings.
    pub fn allowed_users(&self, channel_name: &str) -> EventResult<Option<&[String]>> {
        match self.channels.get(channel_name) {
            None => Ok(None),
            Some(ChannelEntry::Users(users)) => Ok(Some(users.as_slice())),
            Some(ChannelEntry::Invalid(_)) => Err(invalid_entry(channel_name)),
        }
    }

    /// Number of governed channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Whether no channel is governed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Allow `user_name` in `channel_name`, governing the channel if needed.
    ///
    /// An unreadable entry for the channel is replaced by a fresh list.
    /// Returns `false` when the user was already allowed.
    pub fn allow(&mut self, channel_name: &str, user_name: &str) -> bool {
        let entry = self
            .channels
            .entry(channel_name.to_owned())
            .or_insert_with(|| ChannelEntry::Users(Vec::new()));
        match entry {
            ChannelEntry::Users(users) if users.iter().any(|u| u == user_name) => false,
            ChannelEntry::Users(users) => {
                users.push(user_name.to_owned());
                true
            }
            ChannelEntry::Invalid(_) => {
                *entry = ChannelEntry::Users(vec![user_name.to_owned()]);
                true
            }
        }
    }

    /// Remove `user_name` from `channel_name`.
    ///
    /// The channel stays governed even when its set becomes empty. Returns
    /// `false` when there was nothing to remove.
    pub fn revoke(&mut self, channel_name: &str, user_name: &str) -> bool {
        let Some(ChannelEntry::Users(users)) = self.channels.get_mut(channel_name) else {
            return false;
        };
        let before = users.len();
        users.retain(|u| u != user_name);
        users.len() != before
    }

    /// Stop governing `channel_name`. Returns `false` if it was not governed.
    pub fn open_channel(&mut self, channel_name: &str) -> bool {
        self.channels.remove(channel_name).is_some()
    }
}

fn invalid_entry(channel_name: &str) -> EventError {
    EventError::Configuration(format!(
        "whitelist entry for channel {channel_name} must be an array of user names"
    ))
}

impl<K, V, U> FromIterator<(K, V)> for Whitelist
where
    K: Into<String>,
    V: IntoIterator<Item = U>,
    U: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let channels = iter
            .into_iter()
            .map(|(channel, users)| {
                let users = users.into_iter().map(Into::into).collect();
                (channel.into(), ChannelEntry::Users(users))
            })
            .collect();
        Self { channels }
    }
}
