//! Unit tests for Slack secret loading.
//!
//! The keychain service `channel-bouncer` is assumed to be absent in test
//! environments, so these exercise the env-var fallback. They mutate
//! process-global env vars and therefore run serially.

use channel_bouncer::config::GlobalConfig;
use channel_bouncer::AppError;

fn make_config() -> GlobalConfig {
    GlobalConfig::from_toml_str(
        r#"
[whitelist]
database_url = "sqlite::memory:"
collection = "whitelist"
"#,
    )
    .expect("config parses")
}

fn clear_env() {
    std::env::remove_var("SLACK_VERIFICATION_TOKEN");
    std::env::remove_var("SLACK_OAUTH_TOKEN");
}

#[tokio::test]
#[serial_test::serial]
async fn env_var_credentials_are_loaded() {
    let mut config = make_config();
    std::env::set_var("SLACK_VERIFICATION_TOKEN", "verify-test");
    std::env::set_var("SLACK_OAUTH_TOKEN", "xoxb-test");

    let result = config.load_credentials().await;
    clear_env();

    assert!(result.is_ok(), "load_credentials should succeed with env vars");
    assert_eq!(config.slack.verification_token, "verify-test");
    assert_eq!(config.slack.bot_token, "xoxb-test");
}

#[tokio::test]
#[serial_test::serial]
async fn missing_verification_token_is_fatal() {
    let mut config = make_config();
    clear_env();
    std::env::set_var("SLACK_OAUTH_TOKEN", "xoxb-test");

    let result = config.load_credentials().await;
    clear_env();

    match result {
        Err(AppError::Config(msg)) => assert!(msg.contains("SLACK_VERIFICATION_TOKEN"), "message: {msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
}

#[tokio::test]
#[serial_test::serial]
async fn empty_bot_token_is_fatal() {
    let mut config = make_config();
    std::env::set_var("SLACK_VERIFICATION_TOKEN", "verify-test");
    std::env::set_var("SLACK_OAUTH_TOKEN", "");

    let result = config.load_credentials().await;
    clear_env();

    match result {
        Err(AppError::Config(msg)) => assert!(msg.contains("SLACK_OAUTH_TOKEN"), "message: {msg}"),
        other => panic!("expected config error, got {other:?}"),
    }
}
