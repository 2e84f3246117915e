//! Capabilities the membership evaluator depends on.
//!
//! The evaluator never talks to Slack or the whitelist store directly; it
//! receives implementations of these traits at construction time. The
//! production implementations are [`SlackService`](crate::slack::client::SlackService)
//! and [`WhitelistRepo`](crate::persistence::whitelist_repo::WhitelistRepo).

use std::future::Future;
use std::pin::Pin;

use crate::models::membership::{ChannelInfo, UserInfo};
use crate::models::whitelist::Whitelist;
use crate::EventResult;

/// Boxed future returned by capability methods.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = EventResult<T>> + Send + 'a>>;

/// Workspace messaging operations.
pub trait WorkspaceGateway: Send + Sync {
    /// Resolve a channel id to its name.
    ///
    /// `is_private` selects the private-channel lookup where the platform
    /// distinguishes one.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Upstream`](crate::EventError::Upstream) on a
    /// non-success response.
    fn channel_info(&self, channel_id: &str, is_private: bool) -> GatewayFuture<'_, ChannelInfo>;

    /// Resolve a user id to its handle and bot flag.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Upstream`](crate::EventError::Upstream) on a
    /// non-success response.
    fn user_info(&self, user_id: &str) -> GatewayFuture<'_, UserInfo>;

    /// Remove `user_id` from `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Upstream`](crate::EventError::Upstream) on a
    /// non-success response.
    fn kick_member(&self, channel_id: &str, user_id: &str) -> GatewayFuture<'_, ()>;

    /// Post a plain-text message to `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Upstream`](crate::EventError::Upstream) on a
    /// non-success response.
    fn post_message(&self, channel_id: &str, text: &str) -> GatewayFuture<'_, ()>;
}

/// Source of the current whitelist snapshot.
pub trait WhitelistSource: Send + Sync {
    /// Fetch the whitelist document as it is right now.
    ///
    /// `Ok(None)` means the document does not exist at all, which is
    /// distinct from an empty (fully open) whitelist.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Upstream`](crate::EventError::Upstream) if the
    /// store cannot be queried and
    /// [`EventError::Configuration`](crate::EventError::Configuration) if
    /// the stored document is malformed.
    fn fetch_whitelist(&self) -> GatewayFuture<'_, Option<Whitelist>>;
}
