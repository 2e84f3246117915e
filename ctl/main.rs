#![forbid(unsafe_code)]

//! `channel-bouncer-ctl` — whitelist administration for `channel-bouncer`.
//!
//! Reads the same config file as the server and edits the whitelist document
//! in place. Changes are picked up by the server on the next join event.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use channel_bouncer::config::GlobalConfig;
use channel_bouncer::models::whitelist::Whitelist;
use channel_bouncer::persistence::db;
use channel_bouncer::persistence::whitelist_repo::WhitelistRepo;
use channel_bouncer::{AppError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "channel-bouncer-ctl",
    about = "Manage the channel-bouncer whitelist",
    version,
    long_about = None
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the stored whitelist document.
    Show,

    /// Replace the stored document with the contents of a JSON file.
    Import {
        /// File containing `{"channel": ["user", ...], ...}`.
        file: PathBuf,
    },

    /// Allow a user in a channel (the channel becomes governed).
    Allow {
        /// Channel name without the leading `#`.
        channel: String,
        /// User handle.
        user: String,
    },

    /// Remove a user from a channel's list.
    Revoke {
        /// Channel name without the leading `#`.
        channel: String,
        /// User handle.
        user: String,
    },

    /// Stop governing a channel so anyone may join.
    Open {
        /// Channel name without the leading `#`.
        channel: String,
    },

    /// Delete the stored document. The server rejects join events until a
    /// new one is imported.
    Clear,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("error: failed to build tokio runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<String> {
    let config = GlobalConfig::load_from_path(&args.config)?;
    let pool = Arc::new(db::connect(&config.whitelist.database_url).await?);
    let repo = WhitelistRepo::new(pool, config.whitelist.collection);

    match args.command {
        Command::Show => show(&repo).await,
        Command::Import { file } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|err| AppError::Io(format!("cannot read {}: {err}", file.display())))?;
            let whitelist = Whitelist::from_document(&raw)
                .map_err(|err| AppError::Config(err.to_string()))?
                .ok_or_else(|| AppError::Config("refusing to import a blank or null document".into()))?;
            whitelist
                .validate()
                .map_err(|err| AppError::Config(err.to_string()))?;
            repo.replace(&whitelist).await?;
            Ok(format!("imported {} governed channel(s)", whitelist.len()))
        }
        Command::Allow { channel, user } => {
            let mut whitelist = load_or_new(&repo).await?;
            let changed = whitelist.allow(&channel, &user);
            repo.replace(&whitelist).await?;
            Ok(if changed {
                format!("{user} allowed in {channel}")
            } else {
                format!("{user} was already allowed in {channel}")
            })
        }
        Command::Revoke { channel, user } => {
            let mut whitelist = load_or_new(&repo).await?;
            if !whitelist.revoke(&channel, &user) {
                return Ok(format!("{user} was not on the list for {channel}"));
            }
            repo.replace(&whitelist).await?;
            Ok(format!("{user} removed from {channel}"))
        }
        Command::Open { channel } => {
            let mut whitelist = load_or_new(&repo).await?;
            if !whitelist.open_channel(&channel) {
                return Ok(format!("{channel} was not governed"));
            }
            repo.replace(&whitelist).await?;
            Ok(format!("{channel} is now open to everyone"))
        }
        Command::Clear => Ok(if repo.delete().await? {
            format!("whitelist document in collection '{}' deleted", repo.collection())
        } else {
            format!("collection '{}' had no whitelist document", repo.collection())
        }),
    }
}

async fn show(repo: &WhitelistRepo) -> Result<String> {
    let stored = repo
        .fetch_stored()
        .await
        .map_err(|err| AppError::Db(err.to_string()))?;

    let Some(stored) = stored else {
        return Ok(format!(
            "collection '{}' has no row, or its document is null or blank (the server will reject join events)",
            repo.collection()
        ));
    };

    let pretty = serde_json::to_string_pretty(&stored.whitelist)
        .map_err(|err| AppError::Db(format!("failed to render whitelist: {err}")))?;
    let mut report = format!("{pretty}\n(updated {})", stored.updated_at.to_rfc3339());
    if let Err(err) = stored.whitelist.validate() {
        report.push_str(&format!("\nwarning: {err}"));
    }
    Ok(report)
}

/// The stored document, or an empty one when none exists yet.
async fn load_or_new(repo: &WhitelistRepo) -> Result<Whitelist> {
    repo.fetch()
        .await
        .map(Option::unwrap_or_default)
        .map_err(|err| AppError::Db(err.to_string()))
}
