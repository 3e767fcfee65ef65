// messaging-server/src/lib.rs
// ============================================================================
// Module: Messaging Server
// Description: axum HTTP surface for webhook ingestion, campaign triggers,
//              and liveness.
// Purpose: Wire messaging-core's WebhookIngestor and CampaignOrchestrator to
//          the minimal external HTTP surface of §6.
// Dependencies: messaging-core, axum
// ============================================================================

//! ## Overview
//! `messaging-server` exposes exactly the endpoints a Twilio-compatible
//! provider and an operator need: inbound/status webhooks, a campaign
//! trigger, and a liveness probe. All domain logic lives in
//! `messaging-core`; this crate only adapts HTTP to it.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod handlers;
pub mod state;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use state::AppState;

// ============================================================================
// SECTION: Router
// ============================================================================

use axum::Router;
use axum::routing::get;
use axum::routing::post;

/// Builds the application router over `state`.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/inbound", post(handlers::webhooks_inbound))
        .route("/webhooks/status", post(handlers::webhooks_status))
        .route("/campaigns/{id}/trigger", post(handlers::campaigns_trigger))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}
