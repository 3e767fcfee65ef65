// messaging-core/src/runtime/ingestor.rs
// ============================================================================
// Module: Webhook Ingestor
// Description: Raw-capture and normalization of inbound/status webhooks.
// Purpose: Implement the two bounded-latency webhook entry points.
// Dependencies: crate::{core, interfaces, runtime::consent_service}
// ============================================================================

//! ## Overview
//! Both entry points persist the raw payload unconditionally before
//! attempting any extraction, so a malformed or unexpected payload shape
//! never loses capture: extraction failures are logged and the request
//! still succeeds (§4.6).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::AttributeBag;
use crate::core::CallbackKind;
use crate::core::E164;
use crate::core::Timestamp;
use crate::core::events::DeliveryReceipt;
use crate::core::events::InboundEvent;
use crate::interfaces::MessageTransitionFields;
use crate::interfaces::Store;
use crate::interfaces::StoreError;
use crate::runtime::consent_service::ConsentService;

// ============================================================================
// SECTION: Wire Forms
// ============================================================================

/// Extracted (but not yet validated) fields of an inbound webhook POST.
#[derive(Debug, Clone, Default)]
pub struct InboundForm {
    /// `From` field: sender's E.164 number.
    pub from: Option<String>,
    /// `Body` field: message text.
    pub body: Option<String>,
    /// `MessageSid` field: provider message identifier.
    pub message_sid: Option<String>,
}

/// Extracted (but not yet validated) fields of a status webhook POST.
#[derive(Debug, Clone, Default)]
pub struct StatusForm {
    /// `MessageSid` field: provider message identifier.
    pub message_sid: Option<String>,
    /// `MessageStatus` field: provider status keyword.
    pub message_status: Option<String>,
    /// `ErrorCode` field: provider error code, if any.
    pub error_code: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by [`WebhookIngestor`]. Extraction failures are not
/// represented here: they are absorbed, not surfaced, per §4.6.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

// ============================================================================
// SECTION: Webhook Ingestor
// ============================================================================

/// Accepts raw inbound and status payloads, persists them unconditionally,
/// and applies normalized side effects.
#[derive(Clone)]
pub struct WebhookIngestor {
    /// Backing store.
    store: Arc<dyn Store>,
    /// Consent service used to apply inbound keywords.
    consent: ConsentService,
}

impl WebhookIngestor {
    /// Creates a new ingestor over `store`, sharing it with `consent`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, consent: ConsentService) -> Self {
        Self { store, consent }
    }

    /// Handles one inbound message webhook call.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] only when the raw-capture write itself
    /// fails; downstream extraction/normalization failures are absorbed.
    pub fn handle_inbound(&self, raw_payload: &str, form: InboundForm, now: Timestamp) -> Result<(), IngestError> {
        let from_e164 = form.from.as_deref().and_then(|raw| E164::parse(raw).ok());
        let normalized_body = form.body.as_ref().map(|b| b.trim().to_string());

        self.store.insert_raw_inbound(InboundEvent {
            id: String::new(),
            raw_payload: raw_payload.to_string(),
            from_e164: from_e164.clone(),
            normalized_body: normalized_body.clone(),
            provider_message_id: form.message_sid.clone(),
            received_at: now,
        })?;

        let Some(from_e164) = from_e164 else {
            warn!("inbound webhook accepted with unparseable From field");
            return Ok(());
        };

        self.store.upsert_recipient(&from_e164, AttributeBag::new(), now)?;

        if let Some(body) = normalized_body {
            self.consent.apply_inbound_keyword(&from_e164, &body, now)?;
        }
        Ok(())
    }

    /// Handles one delivery status webhook call.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError`] only when the raw-capture write itself
    /// fails; downstream extraction/correlation failures are absorbed.
    pub fn handle_status(&self, raw_payload: &str, form: StatusForm, now: Timestamp) -> Result<(), IngestError> {
        self.store.insert_raw_receipt(DeliveryReceipt {
            id: String::new(),
            raw_payload: raw_payload.to_string(),
            provider_sid: form.message_sid.clone(),
            status: form.message_status.clone(),
            error_code: form.error_code.clone(),
            received_at: now,
        })?;

        let (Some(sid), Some(status_raw)) = (form.message_sid, form.message_status) else {
            debug!("status webhook accepted with missing sid/status");
            return Ok(());
        };
        let Some(kind) = CallbackKind::parse(&status_raw) else {
            warn!(status = %status_raw, "status webhook accepted with unrecognized status keyword");
            return Ok(());
        };
        let Some(message) = self.store.find_message_by_provider_sid(&sid)? else {
            debug!(provider_sid = %sid, "status webhook for unknown provider sid");
            return Ok(());
        };
        let Some(target) = kind.target_for(message.status) else {
            return Ok(());
        };
        self.store.transition_message(
            &message.id,
            message.status,
            target,
            MessageTransitionFields {
                provider_sid: None,
                error_code: form.error_code,
                increment_retry: false,
                at: now,
            },
        )?;
        Ok(())
    }
}
