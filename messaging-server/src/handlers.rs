// messaging-server/src/handlers.rs
// ============================================================================
// Module: HTTP Handlers
// Description: Handlers for the webhook ingest, campaign trigger, and
//              health-check endpoints of §6.
// Purpose: Translate HTTP requests into WebhookIngestor/CampaignOrchestrator
//          calls and serialize their outcome.
// Dependencies: axum, messaging-core, serde_urlencoded
// ============================================================================

//! ## Overview
//! Webhook handlers always respond 200 once raw capture succeeds, even when
//! the payload cannot be fully extracted or normalized, matching the
//! bounded-latency guarantee of the ingest entry points. The trigger handler
//! is idempotent under concurrent callers by construction of
//! [`messaging_core::CampaignOrchestrator::trigger`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use messaging_core::CampaignId;
use messaging_core::OrchestratorError;
use messaging_core::RunToken;
use messaging_core::Timestamp;
use messaging_core::runtime::InboundForm;
use messaging_core::runtime::StatusForm;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::state::AppState;

// ============================================================================
// SECTION: Wire Forms
// ============================================================================

/// Form fields accepted on `POST /webhooks/inbound`.
#[derive(Debug, Deserialize, Default)]
struct InboundWire {
    /// Sender's E.164 number.
    #[serde(default, rename = "From")]
    from: Option<String>,
    /// Message text.
    #[serde(default, rename = "Body")]
    body: Option<String>,
    /// Provider message identifier.
    #[serde(default, rename = "MessageSid")]
    message_sid: Option<String>,
}

/// Form fields accepted on `POST /webhooks/status`.
#[derive(Debug, Deserialize, Default)]
struct StatusWire {
    /// Provider message identifier.
    #[serde(default, rename = "MessageSid")]
    message_sid: Option<String>,
    /// Provider status keyword.
    #[serde(default, rename = "MessageStatus")]
    message_status: Option<String>,
    /// Provider error code.
    #[serde(default, rename = "ErrorCode")]
    error_code: Option<String>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /webhooks/inbound`. The raw-capture and normalization work is
/// synchronous `rusqlite` I/O, so it runs on the blocking thread pool via
/// [`tokio::task::spawn_blocking`] rather than inside the async worker.
pub async fn webhooks_inbound(State(state): State<AppState>, body: axum::body::Bytes) -> StatusCode {
    let raw_payload = String::from_utf8_lossy(&body).into_owned();
    let wire: InboundWire = serde_urlencoded::from_bytes(&body).unwrap_or_default();
    let form = InboundForm { from: wire.from, body: wire.body, message_sid: wire.message_sid };
    let now = Timestamp::from(state.clock.now());
    let ingestor = state.ingestor.clone();
    let result = tokio::task::spawn_blocking(move || ingestor.handle_inbound(&raw_payload, form, now)).await;
    match result {
        Ok(Ok(())) => StatusCode::OK,
        Ok(Err(err)) => {
            error!(error = %err, "inbound webhook raw capture failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        Err(join_err) => {
            error!(error = %join_err, "inbound webhook handling task panicked");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `POST /webhooks/status`. See [`webhooks_inbound`] for the
/// `spawn_blocking` rationale.
pub async fn webhooks_status(State(state): State<AppState>, body: axum::body::Bytes) -> StatusCode {
    let raw_payload = String::from_utf8_lossy(&body).into_owned();
    let wire: StatusWire = serde_urlencoded::from_bytes(&body).unwrap_or_default();
    let form = StatusForm { message_sid: wire.message_sid, message_status: wire.message_status, error_code: wire.error_code };
    let now = Timestamp::from(state.clock.now());
    let ingestor = state.ingestor.clone();
    let result = tokio::task::spawn_blocking(move || ingestor.handle_status(&raw_payload, form, now)).await;
    match result {
        Ok(Ok(())) => StatusCode::OK,
        Ok(Err(err)) => {
            error!(error = %err, "status webhook raw capture failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        Err(join_err) => {
            error!(error = %join_err, "status webhook handling task panicked");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `POST /campaigns/{id}/trigger`. Materialization and pipeline dispatch
/// (Store I/O plus the blocking `ProviderClient` send) run on the
/// blocking thread pool via [`tokio::task::spawn_blocking`].
pub async fn campaigns_trigger(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let campaign_id = CampaignId::from(id.as_str());
    let orchestrator = state.orchestrator.clone();
    let trigger_id = campaign_id.clone();
    let result = tokio::task::spawn_blocking(move || orchestrator.trigger(&trigger_id)).await;
    match result {
        Ok(Ok(status)) => {
            let task_id = RunToken::new(campaign_id.as_str());
            (StatusCode::OK, Json(json!({ "status": status, "taskId": task_id.as_str() })))
        }
        Ok(Err(OrchestratorError::CampaignNotFound(_))) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": "campaign not found" })))
        }
        Ok(Err(err)) => {
            error!(error = %err, "campaign trigger failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal error" })))
        }
        Err(join_err) => {
            error!(error = %join_err, "campaign trigger task panicked");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "internal error" })))
        }
    }
}

/// `GET /healthz`. The Store probe runs on the blocking thread pool via
/// [`tokio::task::spawn_blocking`].
pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let probe = CampaignId::from("__healthz_probe__");
    let store = state.store.clone();
    let result = tokio::task::spawn_blocking(move || store.list_non_terminal_messages(&probe)).await;
    match result {
        Ok(Ok(_)) => (StatusCode::OK, Json(json!({ "status": "ok" }))),
        Ok(Err(err)) => {
            error!(error = %err, "healthz probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
        Err(join_err) => {
            error!(error = %join_err, "healthz probe task panicked");
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
        }
    }
}
