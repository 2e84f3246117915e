//! HTTP surface: the Slack Events API endpoint and a health probe.
//!
//! Each request runs on its own task. Nothing is serialised between
//! requests, so duplicate deliveries for the same join are evaluated
//! independently.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::policy::evaluator::MembershipEvaluator;
use crate::slack::events::{self, InboundRequest};
use crate::{AppError, EventError, GlobalConfig, Result};

/// Shared state handed to every request.
pub struct AppState {
    /// Validated configuration including Slack secrets.
    pub config: Arc<GlobalConfig>,
    /// Membership policy evaluator.
    pub evaluator: MembershipEvaluator,
}

impl IntoResponse for EventError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            (StatusCode::BAD_REQUEST, "bad request").into_response()
        } else {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
        }
    }
}

/// Handler for `GET /health`.
async fn health() -> &'static str {
    "ok"
}

/// Handler for Slack Events API callbacks.
async fn handle_slack_event(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> std::result::Result<Response, EventError> {
    let request = events::parse_request(&body, &state.config.slack.verification_token)
        .inspect_err(|err| warn!(%err, "rejected inbound request"))?;

    match request {
        InboundRequest::UrlVerification { challenge } => {
            info!("answering url_verification challenge");
            Ok(Json(json!({ "challenge": challenge })).into_response())
        }
        InboundRequest::MemberJoined(event) => {
            let event_id = event
                .event_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let span = info_span!("member_joined_channel", %event_id);

            async {
                info!(channel_id = %event.channel_id, user_id = %event.user_id, "member joined channel");
                match state.evaluator.evaluate(&event).await {
                    Ok(verdict) => {
                        info!(?verdict, "membership event handled");
                        Ok(Json(json!({ "ok": true })).into_response())
                    }
                    Err(err) => {
                        error!(%err, "failed to handle member_joined_channel event");
                        Err(err)
                    }
                }
            }
            .instrument(span)
            .await
        }
    }
}

/// Build the router for `state`.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let events_path = state.config.http.events_path.clone();
    Router::new()
        .route("/health", get(health))
        .route(&events_path, post(handle_slack_event))
        .with_state(state)
}

/// Bind `config.http.host:config.http.port` and serve until `ct` fires.
///
/// # Errors
///
/// Returns `AppError::Server` if binding fails or the server stops with an
/// error.
pub async fn serve(state: Arc<AppState>, ct: CancellationToken) -> Result<()> {
    let http = &state.config.http;
    let listener = TcpListener::bind((http.host.as_str(), http.port))
        .await
        .map_err(|err| {
            AppError::Server(format!("failed to bind {}:{}: {err}", http.host, http.port))
        })?;

    serve_on(listener, state, ct).await
}

/// Serve on an already-bound listener until `ct` fires.
///
/// # Errors
///
/// Returns `AppError::Server` if the server stops with an error.
pub async fn serve_on(
    listener: TcpListener,
    state: Arc<AppState>,
    ct: CancellationToken,
) -> Result<()> {
    let local = listener
        .local_addr()
        .map_err(|err| AppError::Server(format!("listener has no local address: {err}")))?;
    info!(%local, path = %state.config.http.events_path, "starting HTTP listener");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
        .map_err(|err| AppError::Server(format!("http server error: {err}")))?;

    info!("HTTP listener shut down");
    Ok(())
}
