//! Membership policy evaluator.
//!
//! Decides whether a user who just joined a channel may stay there and, when
//! not, removes them and announces the removal. The whitelist is fetched
//! fresh for every event, so an edit takes effect on the very next join.
//!
//! Concurrent events are not deduplicated: two near-simultaneous joins by the
//! same unauthorized user may both kick and both notify.

use std::sync::Arc;

use tracing::{info, info_span, Instrument};

use crate::gateway::{WhitelistSource, WorkspaceGateway};
use crate::models::membership::{MembershipEvent, UserInfo};
use crate::{EventError, EventResult};

/// Outcome of the admission rule for a governed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The user name is in the channel's allowed set.
    Whitelisted,
    /// Not whitelisted, but the account is a bot.
    BotExempt,
    /// Not whitelisted and not a bot.
    Denied,
}

impl Admission {
    /// Whether the user may stay in the channel.
    #[must_use]
    pub fn is_admitted(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

/// What the evaluator did for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The channel is not in the whitelist; nobody is checked.
    Ungoverned,
    /// The user may stay.
    Admitted(Admission),
    /// The user was kicked and the channel notified.
    Removed,
}

/// Apply the admission rule for a governed channel.
///
/// Comparison is exact and case-sensitive. The bot exemption applies in
/// addition to whitelist membership.
#[must_use]
pub fn decide(allowed: &[String], user: &UserInfo) -> Admission {
    if allowed.iter().any(|name| name == &user.user_name) {
        Admission::Whitelisted
    } else if user.is_bot {
        Admission::BotExempt
    } else {
        Admission::Denied
    }
}

/// Channel message announcing that `user_id` was removed.
#[must_use]
pub fn removal_notice(user_id: &str) -> String {
    format!(
        "Automated Message: <@{user_id}> got the :boot: because they are not on the whitelist for this channel."
    )
}

/// Enforces channel whitelists for membership events.
#[derive(Clone)]
pub struct MembershipEvaluator {
    workspace: Arc<dyn WorkspaceGateway>,
    whitelist: Arc<dyn WhitelistSource>,
}

impl MembershipEvaluator {
    /// Create an evaluator over the given capabilities.
    #[must_use]
    pub fn new(workspace: Arc<dyn WorkspaceGateway>, whitelist: Arc<dyn WhitelistSource>) -> Self {
        Self {
            workspace,
            whitelist,
        }
    }

    /// Decide and enforce admission for one event.
    ///
    /// Steps run strictly in order and the first failure aborts the rest:
    /// resolve channel, fetch whitelist, resolve user (governed channels
    /// only), then kick followed by notify when denied.
    ///
    /// # Errors
    ///
    /// - `EventError::Upstream` if a Slack call or the whitelist fetch fails.
    /// - `EventError::Configuration` if the whitelist document is absent or
    ///   malformed, or the joined channel's entry is not a list of names.
    pub async fn evaluate(&self, event: &MembershipEvent) -> EventResult<Verdict> {
        let span = info_span!(
            "evaluate_membership",
            channel_id = %event.channel_id,
            user_id = %event.user_id,
            private = event.channel_type.is_private(),
        );
        self.evaluate_inner(event).instrument(span).await
    }

    async fn evaluate_inner(&self, event: &MembershipEvent) -> EventResult<Verdict> {
        let channel = self
            .workspace
            .channel_info(&event.channel_id, event.channel_type.is_private())
            .await?;

        let whitelist = self.whitelist.fetch_whitelist().await?.ok_or_else(|| {
            EventError::Configuration("whitelist document is missing from the store".into())
        })?;

        let Some(allowed) = whitelist.allowed_users(&channel.channel_name)? else {
            info!(channel = %channel.channel_name, "channel is not whitelist-governed");
            return Ok(Verdict::Ungoverned);
        };

        let user = self.workspace.user_info(&event.user_id).await?;
        let admission = decide(allowed, &user);
        info!(
            user = %user.user_name,
            channel = %channel.channel_name,
            ?admission,
            "admission decided"
        );

        if admission.is_admitted() {
            return Ok(Verdict::Admitted(admission));
        }

        self.workspace
            .kick_member(&event.channel_id, &event.user_id)
            .await?;
        info!(user = %user.user_name, channel = %channel.channel_name, "kicked; notifying channel");

        self.workspace
            .post_message(&event.channel_id, &removal_notice(&event.user_id))
            .await?;

        Ok(Verdict::Removed)
    }
}
