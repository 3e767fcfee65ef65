// messaging-core/src/core/identifiers.rs
// ============================================================================
// Module: Messaging Identifiers
// Description: Canonical opaque identifiers for messaging platform entities.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the opaque string-based identifiers used throughout
//! the messaging platform. Identifiers serialize as plain strings. Validation
//! beyond non-emptiness is handled at the boundary that constructs them
//! (e.g. the [`crate::core::recipient::E164`] newtype validates phone shape).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Macro
// ============================================================================

/// Declares an opaque, string-backed identifier newtype.
macro_rules! opaque_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

opaque_id!(CampaignId, "Campaign identifier.");
opaque_id!(MessageId, "Message identifier, opaque and Store-assigned.");
opaque_id!(TemplateId, "Template identifier.");
opaque_id!(SegmentId, "Segment identifier.");
opaque_id!(TopicId, "Subscription topic identifier.");
opaque_id!(AuditId, "Audit record identifier.");
opaque_id!(RunToken, "Opaque token identifying one orchestrator run of a campaign.");

// ============================================================================
// SECTION: Audit Id Generation
// ============================================================================

/// Generates a unique [`AuditId`] from an event's timestamp and subject
/// string plus a process-local monotonic counter, so records raised within
/// the same second for the same subject never collide. Audit ids are
/// assigned by the caller rather than the Store, since the append-only
/// trail has no compare-and-set step to thread an id back through.
#[must_use]
pub fn next_audit_id(at: crate::core::time::Timestamp, subject: &str) -> AuditId {
    use std::sync::atomic::AtomicU64;
    use std::sync::atomic::Ordering;
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    AuditId::new(format!("{}-{subject}-{seq}", at.unix_seconds()))
}
