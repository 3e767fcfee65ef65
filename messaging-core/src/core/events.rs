// messaging-core/src/core/events.rs
// ============================================================================
// Module: Append-Only Events
// Description: Raw inbound/receipt capture rows and the audit trail.
// Purpose: Provide the three append-only entities the Store never mutates.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Three entities in the data model are append-only by invariant: inbound
//! events, delivery receipts, and audit records. None of them are ever
//! updated in place; the Store exposes only insert/list operations for them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::AuditId;
use crate::core::identifiers::CampaignId;
use crate::core::identifiers::MessageId;
use crate::core::recipient::E164;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Inbound Event
// ============================================================================

/// Append-only capture of an inbound webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Store-assigned identity.
    pub id: String,
    /// Raw payload, verbatim.
    pub raw_payload: String,
    /// Extracted sender, when extraction succeeded.
    pub from_e164: Option<E164>,
    /// Extracted, normalized body text.
    pub normalized_body: Option<String>,
    /// Provider-assigned message identifier for the inbound message.
    pub provider_message_id: Option<String>,
    /// Capture timestamp.
    pub received_at: Timestamp,
}

// ============================================================================
// SECTION: Delivery Receipt
// ============================================================================

/// Append-only capture of a status-callback payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Store-assigned identity.
    pub id: String,
    /// Raw payload, verbatim.
    pub raw_payload: String,
    /// Extracted provider identifier, when extraction succeeded.
    pub provider_sid: Option<String>,
    /// Extracted status string, when extraction succeeded.
    pub status: Option<String>,
    /// Extracted provider error code.
    pub error_code: Option<String>,
    /// Capture timestamp.
    pub received_at: Timestamp,
}

// ============================================================================
// SECTION: Audit Trail
// ============================================================================

/// The subject an audit record pertains to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSubject {
    /// A recipient, identified by E.164.
    Recipient(E164),
    /// A message, identified by its Store-assigned id.
    Message(MessageId),
    /// A campaign, identified by its id.
    Campaign(CampaignId),
}

/// The kind of event an audit record captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A keyword-driven consent transition.
    ConsentKeywordTransition,
    /// An admin-initiated re-opt-in, the only sanctioned `STOP` escape.
    ConsentAdminReoptIn,
    /// A recipient was skipped at materialization (template render failure).
    MaterializationSkipped,
    /// Outcome of compliance-pipeline stage 1 (consent).
    PipelineConsent,
    /// Outcome of compliance-pipeline stage 2 (quiet hours).
    PipelineQuietHours,
    /// Outcome of compliance-pipeline stage 3 (rate limit).
    PipelineRateLimit,
    /// Outcome of compliance-pipeline stage 4 (content validation).
    PipelineContent,
    /// Outcome of compliance-pipeline stage 5 (dispatch).
    PipelineDispatch,
    /// A campaign lifecycle transition.
    CampaignTransition,
}

/// An append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Store-assigned identity.
    pub id: AuditId,
    /// Event kind.
    pub kind: AuditKind,
    /// Subject the event pertains to.
    pub subject: AuditSubject,
    /// Free-form structured detail.
    pub detail: Value,
    /// Event timestamp.
    pub at: Timestamp,
}
