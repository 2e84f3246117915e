//! Error types shared across the application.
//!
//! Two channels are kept apart on purpose: [`AppError`] covers startup and
//! administration failures that abort the process or the CLI command, while
//! [`EventError`] covers failures while handling a single inbound event and
//! is turned into an HTTP reply at the boundary.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type for the per-event pipeline.
pub type EventResult<T> = std::result::Result<T, EventError>;

/// Startup and administration failures.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Persistence failure when interacting with `SQLite`.
    Db(String),
    /// Slack client construction failure.
    Slack(String),
    /// HTTP listener bind or serve failure.
    Server(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Db(msg) => write!(f, "db: {msg}"),
            Self::Slack(msg) => write!(f, "slack: {msg}"),
            Self::Server(msg) => write!(f, "server: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Db(err.to_string())
    }
}

/// Failures raised while handling one membership event.
#[derive(Debug)]
pub enum EventError {
    /// Inbound payload rejected before the evaluator runs (bad token,
    /// malformed or unrecognized shape).
    Validation(String),
    /// A Slack or whitelist store call failed.
    Upstream(String),
    /// The whitelist document is missing or malformed.
    Configuration(String),
}

impl EventError {
    /// Whether the failure was caused by the caller rather than the service.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for EventError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(msg) => write!(f, "validation: {msg}"),
            Self::Upstream(msg) => write!(f, "upstream: {msg}"),
            Self::Configuration(msg) => write!(f, "configuration: {msg}"),
        }
    }
}

impl std::error::Error for EventError {}
