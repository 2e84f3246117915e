//! Shared fakes and builders for integration tests.
//!
//! [`FakeWorkspace`] records every capability call so tests can assert both
//! which side effects happened and in what order. [`FakeWhitelist`] serves a
//! swappable document so a single evaluator can observe edits between events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use channel_bouncer::config::GlobalConfig;
use channel_bouncer::gateway::{GatewayFuture, WhitelistSource, WorkspaceGateway};
use channel_bouncer::models::membership::{ChannelInfo, ChannelType, MembershipEvent, UserInfo};
use channel_bouncer::models::whitelist::Whitelist;
use channel_bouncer::policy::evaluator::MembershipEvaluator;
use channel_bouncer::server::AppState;
use channel_bouncer::EventError;

pub const VERIFICATION_TOKEN: &str = "verify-me";

/// One recorded capability call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ChannelInfo { channel_id: String, is_private: bool },
    UserInfo { user_id: String },
    Kick { channel_id: String, user_id: String },
    Post { channel_id: String, text: String },
}

/// In-memory workspace with configurable failures.
#[derive(Default)]
pub struct FakeWorkspace {
    channels: HashMap<String, String>,
    users: HashMap<String, (String, bool)>,
    pub fail_kick: bool,
    pub fail_post: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakeWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel(mut self, channel_id: &str, name: &str) -> Self {
        self.channels.insert(channel_id.into(), name.into());
        self
    }

    pub fn with_user(mut self, user_id: &str, name: &str, is_bot: bool) -> Self {
        self.users.insert(user_id.into(), (name.into(), is_bot));
        self
    }

    pub fn failing_kick(mut self) -> Self {
        self.fail_kick = true;
        self
    }

    pub fn failing_post(mut self) -> Self {
        self.fail_post = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Kick and post calls only, in order.
    pub fn side_effects(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Kick { .. } | Call::Post { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl WorkspaceGateway for FakeWorkspace {
    fn channel_info(&self, channel_id: &str, is_private: bool) -> GatewayFuture<'_, ChannelInfo> {
        self.record(Call::ChannelInfo {
            channel_id: channel_id.into(),
            is_private,
        });
        let result = self
            .channels
            .get(channel_id)
            .map(|name| ChannelInfo {
                channel_id: channel_id.into(),
                channel_name: name.clone(),
            })
            .ok_or_else(|| EventError::Upstream("channel_not_found".into()));
        Box::pin(async move { result })
    }

    fn user_info(&self, user_id: &str) -> GatewayFuture<'_, UserInfo> {
        self.record(Call::UserInfo {
            user_id: user_id.into(),
        });
        let result = self
            .users
            .get(user_id)
            .map(|(name, is_bot)| UserInfo {
                user_id: user_id.into(),
                user_name: name.clone(),
                is_bot: *is_bot,
            })
            .ok_or_else(|| EventError::Upstream("user_not_found".into()));
        Box::pin(async move { result })
    }

    fn kick_member(&self, channel_id: &str, user_id: &str) -> GatewayFuture<'_, ()> {
        self.record(Call::Kick {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
        });
        let fail = self.fail_kick;
        Box::pin(async move {
            if fail {
                Err(EventError::Upstream("cant_kick_self".into()))
            } else {
                Ok(())
            }
        })
    }

    fn post_message(&self, channel_id: &str, text: &str) -> GatewayFuture<'_, ()> {
        self.record(Call::Post {
            channel_id: channel_id.into(),
            text: text.into(),
        });
        let fail = self.fail_post;
        Box::pin(async move {
            if fail {
                Err(EventError::Upstream("not_in_channel".into()))
            } else {
                Ok(())
            }
        })
    }
}

/// What the fake store returns on the next fetch.
#[derive(Debug, Clone)]
pub enum Document {
    Present(Whitelist),
    Absent,
    Malformed,
    Unreachable,
}

/// Whitelist source whose document can be swapped between events.
pub struct FakeWhitelist {
    document: Mutex<Document>,
    fetches: Mutex<usize>,
}

impl FakeWhitelist {
    pub fn new(document: Document) -> Self {
        Self {
            document: Mutex::new(document),
            fetches: Mutex::new(0),
        }
    }

    pub fn set(&self, document: Document) {
        *self.document.lock().unwrap() = document;
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

impl WhitelistSource for FakeWhitelist {
    fn fetch_whitelist(&self) -> GatewayFuture<'_, Option<Whitelist>> {
        *self.fetches.lock().unwrap() += 1;
        let result = match self.document.lock().unwrap().clone() {
            Document::Present(wl) => Ok(Some(wl)),
            Document::Absent => Ok(None),
            Document::Malformed => Err(EventError::Configuration("malformed".into())),
            Document::Unreachable => Err(EventError::Upstream("connection refused".into())),
        };
        Box::pin(async move { result })
    }
}

/// Build a whitelist from `(channel, [users])` pairs.
pub fn whitelist(entries: &[(&str, &[&str])]) -> Whitelist {
    entries
        .iter()
        .map(|(channel, users)| (*channel, users.iter().copied()))
        .collect()
}

/// Wire fakes into an evaluator.
pub fn evaluator(
    workspace: &Arc<FakeWorkspace>,
    source: &Arc<FakeWhitelist>,
) -> MembershipEvaluator {
    MembershipEvaluator::new(
        Arc::clone(workspace) as Arc<dyn WorkspaceGateway>,
        Arc::clone(source) as Arc<dyn WhitelistSource>,
    )
}

/// Public-channel join event.
pub fn join(channel_id: &str, user_id: &str) -> MembershipEvent {
    MembershipEvent::new(channel_id, ChannelType::Public, user_id)
}

/// Config with the given port and the test verification token loaded.
pub fn test_config(port: u16) -> GlobalConfig {
    let toml = format!(
        r#"
[http]
host = "127.0.0.1"
port = {port}

[whitelist]
database_url = "sqlite::memory:"
collection = "whitelist"
"#
    );
    let mut config = GlobalConfig::from_toml_str(&toml).expect("valid test config");
    config.slack.verification_token = VERIFICATION_TOKEN.into();
    config.slack.bot_token = "xoxb-test".into();
    config
}

/// Full application state over fakes.
pub fn test_app_state(
    workspace: &Arc<FakeWorkspace>,
    source: &Arc<FakeWhitelist>,
) -> Arc<AppState> {
    Arc::new(AppState {
        config: Arc::new(test_config(0)),
        evaluator: evaluator(workspace, source),
    })
}
