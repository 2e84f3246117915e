//! Slack Events API envelope parsing.
//!
//! Turns a raw request body into an [`InboundRequest`] after checking the
//! verification token. Everything that is not a URL verification handshake
//! or a `member_joined_channel` callback is rejected here, before the
//! evaluator runs.

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::models::membership::{ChannelType, MembershipEvent};
use crate::{EventError, EventResult};

const URL_VERIFICATION: &str = "url_verification";
const EVENT_CALLBACK: &str = "event_callback";
const MEMBER_JOINED_CHANNEL: &str = "member_joined_channel";

/// Outer Events API payload.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    /// Verification token Slack attaches to every request.
    pub token: Option<String>,
    /// Envelope type (`url_verification`, `event_callback`, …).
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Handshake challenge for `url_verification`.
    pub challenge: Option<String>,
    /// Unique id of the wrapped event.
    pub event_id: Option<String>,
    /// Wrapped event for `event_callback`.
    pub event: Option<InnerEvent>,
}

/// The `event` object inside an `event_callback` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct InnerEvent {
    /// Event type, e.g. `member_joined_channel`.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// User who joined.
    pub user: Option<String>,
    /// Channel that was joined.
    pub channel: Option<String>,
    /// `C` for public channels, `G` for private ones.
    pub channel_type: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRequest {
    /// Endpoint ownership handshake; echo the challenge back.
    UrlVerification {
        /// Value to echo.
        challenge: String,
    },
    /// A user joined a channel.
    MemberJoined(MembershipEvent),
}

/// Parse and validate a raw request body.
///
/// # Errors
///
/// Returns `EventError::Validation` if the body is not JSON, the token does
/// not match, or the payload is of an unsupported shape.
pub fn parse_request(body: &[u8], verification_token: &str) -> EventResult<InboundRequest> {
    let envelope: EventEnvelope = serde_json::from_slice(body)
        .map_err(|err| EventError::Validation(format!("malformed payload: {err}")))?;
    classify(envelope, verification_token)
}

/// Validate an already-decoded envelope.
///
/// # Errors
///
/// Returns `EventError::Validation` if the token does not match or the
/// payload is of an unsupported shape.
pub fn classify(envelope: EventEnvelope, verification_token: &str) -> EventResult<InboundRequest> {
    let token_ok = envelope
        .token
        .as_deref()
        .is_some_and(|token| token_matches(token, verification_token));
    if !token_ok {
        // Never log the token values themselves.
        warn!("verification token mismatch");
        return Err(EventError::Validation("verification token mismatch".into()));
    }

    match envelope.kind.as_deref() {
        Some(URL_VERIFICATION) => {
            debug!("url_verification handshake");
            let challenge = envelope
                .challenge
                .ok_or_else(|| EventError::Validation("url_verification without challenge".into()))?;
            Ok(InboundRequest::UrlVerification { challenge })
        }
        Some(EVENT_CALLBACK) => {
            let event = envelope
                .event
                .filter(|event| event.kind.as_deref() == Some(MEMBER_JOINED_CHANNEL))
                .ok_or_else(|| EventError::Validation("unsupported event callback".into()))?;
            let (Some(channel_id), Some(user_id)) = (event.channel, event.user) else {
                return Err(EventError::Validation(
                    "member_joined_channel without channel or user".into(),
                ));
            };

            Ok(InboundRequest::MemberJoined(MembershipEvent {
                channel_id,
                channel_type: ChannelType::from_code(event.channel_type.as_deref()),
                user_id,
                event_id: envelope.event_id,
            }))
        }
        other => Err(EventError::Validation(format!(
            "unsupported request type: {}",
            other.unwrap_or("<none>")
        ))),
    }
}

/// Compare tokens by SHA-256 digest so the comparison time does not depend
/// on how long a common prefix is.
fn token_matches(provided: &str, expected: &str) -> bool {
    Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}
