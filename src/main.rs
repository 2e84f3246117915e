#![forbid(unsafe_code)]

//! `channel-bouncer` — Slack Events API receiver binary.
//!
//! Loads configuration and secrets, opens the whitelist store, builds the
//! Slack client, and serves the events endpoint until Ctrl-C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use channel_bouncer::config::GlobalConfig;
use channel_bouncer::persistence::db;
use channel_bouncer::persistence::whitelist_repo::WhitelistRepo;
use channel_bouncer::policy::evaluator::MembershipEvaluator;
use channel_bouncer::server::{self, AppState};
use channel_bouncer::slack::client::SlackService;
use channel_bouncer::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "channel-bouncer", about = "Slack channel whitelist enforcer", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the HTTP port from the config file.
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("channel-bouncer bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;
    if let Some(port) = args.port {
        config.http.port = port;
    }

    // Missing secrets abort startup.
    config.load_credentials().await?;
    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Whitelist store ─────────────────────────────────
    let pool = Arc::new(db::connect(&config.whitelist.database_url).await?);
    let whitelist = Arc::new(WhitelistRepo::new(
        pool,
        config.whitelist.collection.clone(),
    ));
    info!(collection = %config.whitelist.collection, "whitelist store connected");

    // ── Slack ───────────────────────────────────────────
    let slack = Arc::new(SlackService::new(&config.slack).map_err(|err| {
        error!(%err, "slack client init failed");
        err
    })?);

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        evaluator: MembershipEvaluator::new(slack, whitelist),
    });

    // ── Serve until shutdown ────────────────────────────
    let ct = CancellationToken::new();
    let mut server_handle = tokio::spawn(server::serve(state, ct.clone()));

    let joined = tokio::select! {
        () = shutdown_signal() => {
            info!("shutdown signal received");
            ct.cancel();
            server_handle.await
        }
        joined = &mut server_handle => joined,
    };
    joined.map_err(|err| AppError::Server(format!("server task panicked: {err}")))??;

    info!("channel-bouncer shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
