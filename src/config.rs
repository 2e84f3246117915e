//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::{AppError, Result};

/// Keychain service name under which Slack secrets are stored.
const KEYRING_SERVICE: &str = "channel-bouncer";

/// Slack secrets used by the receiver.
///
/// Tokens are loaded at runtime via OS keychain or environment variables,
/// never from the TOML config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SlackConfig {
    /// Shared secret Slack includes in every Events API payload.
    #[serde(skip)]
    pub verification_token: String,
    /// Bot user OAuth token used for Web API calls.
    #[serde(skip)]
    pub bot_token: String,
}

/// Inbound HTTP listener settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct HttpConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to bind; 0 lets the OS pick one.
    #[serde(default = "default_http_port")]
    pub port: u16,
    /// Route that receives Slack Events API callbacks.
    #[serde(default = "default_events_path")]
    pub events_path: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_http_port(),
            events_path: default_events_path(),
        }
    }
}

/// Location of the whitelist document.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WhitelistStoreConfig {
    /// `SQLite` connection string, e.g. `sqlite://channel-bouncer.db`.
    pub database_url: String,
    /// Key of the whitelist document inside the store.
    pub collection: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_http_port() -> u16 {
    3000
}

fn default_events_path() -> String {
    "/api/onSlackMessage".into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Whitelist store settings.
    pub whitelist: WhitelistStoreConfig,
    /// Slack secrets (populated by [`GlobalConfig::load_credentials`]).
    #[serde(skip)]
    pub slack: SlackConfig,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load Slack secrets from OS keychain with env-var fallback.
    ///
    /// Tries the `channel-bouncer` keyring service first, then falls back
    /// to `SLACK_VERIFICATION_TOKEN` / `SLACK_OAUTH_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// a non-empty value for each secret.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.slack.verification_token =
            load_credential("slack_verification_token", "SLACK_VERIFICATION_TOKEN").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_OAUTH_TOKEN").await?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.whitelist.database_url.trim().is_empty() {
            return Err(AppError::Config(
                "whitelist.database_url must not be empty".into(),
            ));
        }

        if self.whitelist.collection.trim().is_empty() {
            return Err(AppError::Config(
                "whitelist.collection must not be empty".into(),
            ));
        }

        if !self.http.events_path.starts_with('/') {
            return Err(AppError::Config(
                "http.events_path must start with '/'".into(),
            ));
        }

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(keyring::Error::NoEntry) => {}
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(AppError::Config(format!(
            "credential {keyring_key} is empty in {env_key} env var"
        ))),
        Err(_) => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
