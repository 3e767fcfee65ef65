// messaging-core/src/core/mod.rs
// ============================================================================
// Module: Messaging Core Types
// Description: Canonical messaging platform schema.
// Purpose: Provide stable, serializable types for recipients, campaigns,
//          segments, messages, and the append-only audit trail.
// Dependencies: serde, serde_json, chrono
// ============================================================================

//! ## Overview
//! Core types define the data model of §3: recipients and their consent
//! state, templates, segments, campaigns, messages, and the append-only
//! capture/audit rows. These types are the canonical source of truth for
//! the Store, the orchestrator, and the HTTP surface.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod campaign;
pub mod events;
pub mod identifiers;
pub mod message;
pub mod recipient;
pub mod segment;
pub mod template;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use campaign::Campaign;
pub use campaign::CampaignStatus;
pub use campaign::QuietHours;
pub use events::AuditKind;
pub use events::AuditRecord;
pub use events::AuditSubject;
pub use events::DeliveryReceipt;
pub use events::InboundEvent;
pub use identifiers::AuditId;
pub use identifiers::CampaignId;
pub use identifiers::MessageId;
pub use identifiers::RunToken;
pub use identifiers::SegmentId;
pub use identifiers::TemplateId;
pub use identifiers::TopicId;
pub use identifiers::next_audit_id;
pub use message::CallbackKind;
pub use message::Message;
pub use message::MessageStatus;
pub use recipient::AttributeBag;
pub use recipient::ConsentState;
pub use recipient::E164;
pub use recipient::E164Error;
pub use recipient::Recipient;
pub use recipient::Subscription;
pub use recipient::merge_attributes;
pub use segment::CONSENT_STATE_ATTRIBUTE;
pub use segment::Logic;
pub use segment::Operator;
pub use segment::RuleNode;
pub use segment::Segment;
pub use segment::SegmentError;
pub use template::Template;
pub use template::TemplateError;
pub use template::extract_placeholders;
pub use time::Timestamp;
