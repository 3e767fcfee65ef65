// messaging-core/src/runtime/consent_service.rs
// ============================================================================
// Module: Consent Service
// Description: Eligibility checks and keyword-driven consent transitions.
// Purpose: Implement the sole write paths onto Recipient.consent_state.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`ConsentService`] never touches a Message row; it only reads and
//! mutates Recipient consent state through the Store, and appends the
//! audit trail §8 requires for every transition. `STOP` is sticky: only
//! [`ConsentService::admin_reopt_in`] may move a recipient back to
//! `OPT_IN` once `STOP` is recorded, and that path is always
//! distinguishable in the audit trail from a keyword-driven transition.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::debug;
use tracing::warn;

use crate::core::AuditKind;
use crate::core::AuditRecord;
use crate::core::AuditSubject;
use crate::core::ConsentState;
use crate::core::E164;
use crate::core::Timestamp;
use crate::core::next_audit_id;
use crate::interfaces::Store;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Keyword Sets
// ============================================================================

/// Inbound keywords that transition a recipient to `STOP`.
const STOP_KEYWORDS: [&str; 5] = ["STOP", "QUIT", "CANCEL", "UNSUBSCRIBE", "END"];

/// Inbound keywords that transition an `OPT_OUT` recipient back to `OPT_IN`.
const START_KEYWORDS: [&str; 2] = ["START", "UNSTOP"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by [`ConsentService`] operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsentError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The recipient referenced does not exist.
    #[error("recipient not found: {0}")]
    RecipientNotFound(E164),
}

// ============================================================================
// SECTION: Eligibility
// ============================================================================

/// Outcome of an eligibility check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// The recipient is eligible for delivery.
    Ok,
    /// The recipient is not eligible; carries the blocking consent state.
    Blocked(ConsentState),
}

// ============================================================================
// SECTION: Consent Service
// ============================================================================

/// Computes delivery eligibility and applies keyword-driven consent
/// transitions.
#[derive(Clone)]
pub struct ConsentService {
    /// Backing store.
    store: Arc<dyn Store>,
}

impl ConsentService {
    /// Creates a new consent service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Evaluates whether `e164` is currently eligible for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ConsentError::RecipientNotFound`] if the recipient does
    /// not exist, or propagates a [`StoreError`].
    pub fn is_eligible(&self, e164: &E164) -> Result<Eligibility, ConsentError> {
        let recipient = self
            .store
            .get_recipient(e164)?
            .ok_or_else(|| ConsentError::RecipientNotFound(e164.clone()))?;
        Ok(match recipient.consent_state {
            ConsentState::OptIn => Eligibility::Ok,
            other => Eligibility::Blocked(other),
        })
    }

    /// Applies a keyword found in an inbound message body, if any. A no-op
    /// (returning `Ok(None)`) when the body does not carry a recognized
    /// keyword, the recipient does not exist, or `STOP`'s stickiness blocks
    /// a `START` keyword.
    ///
    /// # Errors
    ///
    /// Propagates a [`StoreError`] from the Store calls.
    pub fn apply_inbound_keyword(
        &self,
        e164: &E164,
        body: &str,
        at: Timestamp,
    ) -> Result<Option<ConsentState>, StoreError> {
        let normalized = body.trim().to_ascii_uppercase();
        let Some(target) = keyword_target(&normalized) else {
            return Ok(None);
        };
        let Some(recipient) = self.store.get_recipient(e164)? else {
            debug!(recipient = %e164, "inbound keyword ignored: recipient unknown");
            return Ok(None);
        };
        if !recipient.consent_state.keyword_transition_allowed(target) {
            warn!(recipient = %e164, from = %recipient.consent_state, "STOP is sticky; START keyword ignored");
            return Ok(None);
        }
        if target == ConsentState::OptIn && recipient.consent_state != ConsentState::OptOut {
            return Ok(None);
        }
        let prior = self.store.update_consent(e164, target, "inbound_keyword", at)?;
        self.store.append_audit(AuditRecord {
            id: next_audit_id(at, e164.as_str()),
            kind: AuditKind::ConsentKeywordTransition,
            subject: AuditSubject::Recipient(e164.clone()),
            detail: json!({ "from": prior.to_string(), "to": target.to_string(), "keyword": normalized }),
            at,
        })?;
        Ok(Some(target))
    }

    /// The one sanctioned path from `STOP` back to `OPT_IN`: an explicit
    /// admin action, always recorded distinctly from a keyword transition.
    ///
    /// # Errors
    ///
    /// Propagates a [`StoreError`] from the Store calls.
    pub fn admin_reopt_in(&self, e164: &E164, operator: &str, at: Timestamp) -> Result<(), StoreError> {
        let prior = self.store.update_consent(e164, ConsentState::OptIn, operator, at)?;
        self.store.append_audit(AuditRecord {
            id: next_audit_id(at, e164.as_str()),
            kind: AuditKind::ConsentAdminReoptIn,
            subject: AuditSubject::Recipient(e164.clone()),
            detail: json!({ "from": prior.to_string(), "to": "OPT_IN", "operator": operator }),
            at,
        })
    }
}

/// Maps a normalized inbound body to the consent state it targets.
fn keyword_target(normalized: &str) -> Option<ConsentState> {
    if STOP_KEYWORDS.contains(&normalized) {
        Some(ConsentState::Stop)
    } else if START_KEYWORDS.contains(&normalized) {
        Some(ConsentState::OptIn)
    } else {
        None
    }
}
