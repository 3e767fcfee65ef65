// messaging-core/src/core/recipient.rs
// ============================================================================
// Module: Recipient
// Description: Recipient identity, attribute bag, and consent state.
// Purpose: Provide the canonical Recipient entity and its invariants.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A recipient is identified by an immutable E.164 phone number and carries
//! an open, string-keyed attribute bag plus a consent state that moves
//! monotonically toward `STOP`. See [`ConsentState`] for the transition
//! rules enforced by [`crate::runtime::ConsentService`] and the Store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::time::Timestamp;

// ============================================================================
// SECTION: E.164
// ============================================================================

/// Errors returned when parsing an E.164 phone number.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum E164Error {
    /// The string did not start with `+`.
    #[error("E.164 number must start with '+': {0}")]
    MissingPlus(String),
    /// The digit count fell outside the 8-15 digit range.
    #[error("E.164 number must have 8-15 digits, got {0}")]
    BadDigitCount(usize),
    /// A non-digit character appeared after the leading `+`.
    #[error("E.164 number contains a non-digit character: {0}")]
    NonDigit(String),
}

/// An E.164 phone number: leading `+` and 8-15 digits. Immutable once
/// constructed and used as the Recipient's primary key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct E164(String);

impl E164 {
    /// Parses and validates an E.164 phone number string.
    ///
    /// # Errors
    ///
    /// Returns [`E164Error`] when the string is not a valid E.164 number.
    pub fn parse(raw: &str) -> Result<Self, E164Error> {
        let Some(digits) = raw.strip_prefix('+') else {
            return Err(E164Error::MissingPlus(raw.to_string()));
        };
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(E164Error::NonDigit(raw.to_string()));
        }
        if !(8..=15).contains(&digits.len()) {
            return Err(E164Error::BadDigitCount(digits.len()));
        }
        Ok(Self(raw.to_string()))
    }

    /// Returns the number as a string slice, including the leading `+`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for E164 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Consent State
// ============================================================================

/// Recipient consent state. Transitions are monotone toward `Stop`: once a
/// recipient reaches `Stop`, only an explicit admin re-opt-in event (never a
/// plain `START` keyword) may move it back to `OptIn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentState {
    /// Recipient has opted in and is eligible for delivery.
    OptIn,
    /// Recipient has opted out but may opt back in via the `START` keyword.
    OptOut,
    /// Recipient invoked a stop keyword; sticky against `START`.
    Stop,
}

impl ConsentState {
    /// Returns true if a transition to `to` is permitted by the stickiness
    /// invariant, independent of the source that requested it.
    #[must_use]
    pub fn keyword_transition_allowed(self, to: Self) -> bool {
        !(self == Self::Stop && to == Self::OptIn)
    }
}

impl fmt::Display for ConsentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::OptIn => "OPT_IN",
            Self::OptOut => "OPT_OUT",
            Self::Stop => "STOP",
        };
        f.write_str(s)
    }
}

// ============================================================================
// SECTION: Attribute Bag
// ============================================================================

/// An open, string-keyed, JSON-valued attribute bag carried by a recipient.
pub type AttributeBag = BTreeMap<String, Value>;

/// Merges `incoming` into `base` with last-write-wins semantics per key.
pub fn merge_attributes(base: &mut AttributeBag, incoming: AttributeBag) {
    for (key, value) in incoming {
        base.insert(key, value);
    }
}

// ============================================================================
// SECTION: Recipient
// ============================================================================

/// A recipient row: identity, attribute bag, consent state, and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipient {
    /// Immutable E.164 identity.
    pub e164: E164,
    /// Open attribute bag used by segment evaluation and template rendering.
    pub attributes: AttributeBag,
    /// Current consent state.
    pub consent_state: ConsentState,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// Last-update timestamp.
    pub updated_at: Timestamp,
}

impl Recipient {
    /// Creates a new recipient defaulting to `OPT_IN` consent.
    #[must_use]
    pub fn new(e164: E164, attributes: AttributeBag, now: Timestamp) -> Self {
        Self {
            e164,
            attributes,
            consent_state: ConsentState::OptIn,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// SECTION: Subscription
// ============================================================================

/// A (Recipient, Topic) edge. Carries no state of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Subscribed recipient.
    pub e164: E164,
    /// Subscribed topic.
    pub topic: super::identifiers::TopicId,
}
