#![forbid(unsafe_code)]

//! Slack webhook receiver that keeps whitelisted channels clean.
//!
//! When a user joins a channel whose name appears in the whitelist document,
//! anyone who is neither listed for that channel nor a bot is kicked and the
//! channel is told why.

pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod persistence;
pub mod policy;
pub mod server;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, EventError, EventResult, Result};
