// messaging-server/src/state.rs
// ============================================================================
// Module: Server State
// Description: Shared handler state wiring the Store, Orchestrator, and
//              WebhookIngestor together.
// Purpose: Give axum handlers a single cloneable entry point into the
//          messaging-core runtime.
// Dependencies: messaging-core
// ============================================================================

//! ## Overview
//! [`AppState`] is the `axum` `State` extractor payload shared across every
//! handler. Cloning it is cheap: every field is an `Arc` or a struct of
//! `Arc`s.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use messaging_core::CampaignOrchestrator;
use messaging_core::Clock;
use messaging_core::Store;
use messaging_core::WebhookIngestor;

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    /// Backing store, used directly by the `/healthz` liveness probe.
    pub store: Arc<dyn Store>,
    /// Webhook ingestion entry points.
    pub ingestor: WebhookIngestor,
    /// Campaign orchestrator driving trigger requests.
    pub orchestrator: Arc<CampaignOrchestrator>,
    /// Injected time source, stamping webhook receipt times.
    pub clock: Arc<dyn Clock>,
}
