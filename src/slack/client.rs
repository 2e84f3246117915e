//! Slack Web API client used to look up and remove channel members.
//!
//! Every call goes out immediately and its failure is returned to the
//! caller. Slack's `ok: false` replies surface from slack-morphism as client
//! errors and are reported as [`EventError::Upstream`].

use std::sync::Arc;

use slack_morphism::prelude::{
    SlackApiChatPostMessageRequest, SlackApiConversationsInfoRequest,
    SlackApiConversationsKickRequest, SlackApiToken, SlackApiTokenType, SlackApiTokenValue,
    SlackApiUsersInfoRequest, SlackChannelId, SlackClient, SlackClientHyperHttpsConnector,
    SlackClientSession, SlackMessageContent, SlackUserId,
};
use tracing::{debug, info};

use crate::gateway::{GatewayFuture, WorkspaceGateway};
use crate::models::membership::{ChannelInfo, UserInfo};
use crate::{config::SlackConfig, AppError, EventError, Result};

/// Slack Web API wrapper authenticated with the bot token.
pub struct SlackService {
    client: Arc<SlackClient<SlackClientHyperHttpsConnector>>,
    bot_token: SlackApiToken,
}

impl SlackService {
    /// Build the HTTPS client.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Slack` if the HTTPS connector cannot be created.
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let connector = SlackClientHyperHttpsConnector::new()
            .map_err(|err| AppError::Slack(format!("failed to init slack connector: {err}")))?;
        let client = Arc::new(SlackClient::new(connector));
        let bot_token = SlackApiToken {
            token_value: SlackApiTokenValue(config.bot_token.clone()),
            cookie: None,
            team_id: None,
            scope: None,
            token_type: Some(SlackApiTokenType::Bot),
        };

        info!("slack web api client ready");
        Ok(Self { client, bot_token })
    }

    /// Create an HTTP session for direct API calls using the bot token.
    #[must_use]
    pub fn http_session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.bot_token)
    }
}

impl WorkspaceGateway for SlackService {
    fn channel_info(&self, channel_id: &str, is_private: bool) -> GatewayFuture<'_, ChannelInfo> {
        let channel_id = channel_id.to_owned();
        Box::pin(async move {
            // conversations.info serves public and private channels alike.
            debug!(%channel_id, is_private, "conversations.info");
            let request = SlackApiConversationsInfoRequest::new(SlackChannelId(channel_id.clone()));
            let response = self
                .http_session()
                .conversations_info(&request)
                .await
                .map_err(|err| EventError::Upstream(format!("failed to read channel info: {err}")))?;

            let channel_name = response.channel.name.ok_or_else(|| {
                EventError::Upstream(format!("channel {channel_id} has no name"))
            })?;

            Ok(ChannelInfo {
                channel_id,
                channel_name,
            })
        })
    }

    fn user_info(&self, user_id: &str) -> GatewayFuture<'_, UserInfo> {
        let user_id = user_id.to_owned();
        Box::pin(async move {
            let request = SlackApiUsersInfoRequest::new(SlackUserId(user_id.clone()));
            let response = self
                .http_session()
                .users_info(&request)
                .await
                .map_err(|err| EventError::Upstream(format!("failed to read user info: {err}")))?;

            let user_name = response
                .user
                .name
                .ok_or_else(|| EventError::Upstream(format!("user {user_id} has no name")))?;

            Ok(UserInfo {
                user_id,
                user_name,
                is_bot: response.user.flags.is_bot.unwrap_or(false),
            })
        })
    }

    fn kick_member(&self, channel_id: &str, user_id: &str) -> GatewayFuture<'_, ()> {
        let request = SlackApiConversationsKickRequest::new(
            SlackChannelId(channel_id.to_owned()),
            SlackUserId(user_id.to_owned()),
        );
        Box::pin(async move {
            self.http_session()
                .conversations_kick(&request)
                .await
                .map_err(|err| EventError::Upstream(format!("failed to kick member: {err}")))?;
            Ok(())
        })
    }

    fn post_message(&self, channel_id: &str, text: &str) -> GatewayFuture<'_, ()> {
        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel_id.to_owned()),
            SlackMessageContent::new().with_text(text.to_owned()),
        )
        .with_link_names(true);
        Box::pin(async move {
            self.http_session()
                .chat_post_message(&request)
                .await
                .map_err(|err| EventError::Upstream(format!("failed to post message: {err}")))?;
            Ok(())
        })
    }
}
