// messaging-core/src/core/message.rs
// ============================================================================
// Module: Message
// Description: Message identity, status DAG, and status-callback transitions.
// Purpose: Provide the canonical Message entity and its transition guards.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A message's status follows a directed acyclic graph from `QUEUED` through
//! `SENDING` to a terminal state. [`MessageStatus::callback_target`]
//! implements the status-callback transition table (§4.7): every guard is a
//! pure function so the Store's compare-and-set can apply it without taking
//! a lock across I/O, and replayed or out-of-order callbacks collapse to
//! no-ops rather than regressing state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CampaignId;
use crate::core::identifiers::MessageId;
use crate::core::recipient::E164;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Message Status
// ============================================================================

/// Message delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    /// Materialized, awaiting the compliance pipeline.
    Queued,
    /// Mid-dispatch: the provider call is in flight.
    Sending,
    /// Accepted by the provider; a `providerSid` has been recorded.
    Sent,
    /// Confirmed delivered by a status callback.
    Delivered,
    /// Confirmed read by a status callback.
    Read,
    /// Terminal failure; no further transitions are possible.
    Failed,
    /// Terminal provider-reported non-delivery.
    Undelivered,
}

impl MessageStatus {
    /// Returns true when `self` is a terminal status: no further transition
    /// is ever legal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Read | Self::Failed | Self::Undelivered
        )
    }
}

/// Inbound status-callback kind, as normalized from the provider's
/// lower-case `MessageStatus` wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackKind {
    /// Provider reports the message entered its send queue.
    Queued,
    /// Provider reports the message was sent.
    Sent,
    /// Provider reports the message was delivered.
    Delivered,
    /// Provider reports the message was read (read receipts).
    Read,
    /// Provider reports permanent failure.
    Failed,
    /// Provider reports the message could not be delivered.
    Undelivered,
}

impl CallbackKind {
    /// Parses the provider's `MessageStatus` wire value (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "queued" => Some(Self::Queued),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "read" => Some(Self::Read),
            "failed" => Some(Self::Failed),
            "undelivered" => Some(Self::Undelivered),
            _ => None,
        }
    }

    /// Applies the status-callback transition table (§4.7) to `current`.
    /// Returns `None` when the callback is a no-op for the current status
    /// (including `queued`, which never advances a Message that already
    /// exists, and any callback delivered to a terminal status).
    #[must_use]
    pub fn target_for(self, current: MessageStatus) -> Option<MessageStatus> {
        use CallbackKind::{Delivered, Failed, Queued, Read, Sent, Undelivered};
        use MessageStatus::{Queued as MQueued, Sending};

        if current.is_terminal() {
            return None;
        }
        match self {
            Queued => None,
            Sent => match current {
                MQueued | Sending => Some(MessageStatus::Sent),
                MessageStatus::Sent | MessageStatus::Delivered => None,
                MessageStatus::Read | MessageStatus::Failed | MessageStatus::Undelivered => None,
            },
            Delivered => match current {
                MQueued | Sending | MessageStatus::Sent => Some(MessageStatus::Delivered),
                MessageStatus::Delivered => None,
                MessageStatus::Read | MessageStatus::Failed | MessageStatus::Undelivered => None,
            },
            Read => match current {
                MQueued | Sending | MessageStatus::Sent | MessageStatus::Delivered => {
                    Some(MessageStatus::Read)
                }
                MessageStatus::Read | MessageStatus::Failed | MessageStatus::Undelivered => None,
            },
            Failed | Undelivered => {
                let target = if self == Failed {
                    MessageStatus::Failed
                } else {
                    MessageStatus::Undelivered
                };
                match current {
                    MQueued | Sending | MessageStatus::Sent => Some(target),
                    MessageStatus::Delivered => None,
                    MessageStatus::Read | MessageStatus::Failed | MessageStatus::Undelivered => None,
                }
            }
        }
    }
}

// ============================================================================
// SECTION: Message
// ============================================================================

/// A message row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque Store-assigned identity.
    pub id: MessageId,
    /// Owning campaign.
    pub campaign_id: CampaignId,
    /// Recipient this message was materialized for.
    pub recipient: E164,
    /// Rendered content, set once at materialization.
    pub rendered_content: String,
    /// Current delivery status.
    pub status: MessageStatus,
    /// Provider-assigned identifier, set on successful dispatch. Unique
    /// across all messages once set.
    pub provider_sid: Option<String>,
    /// Provider or validation error code, set on failure.
    pub error_code: Option<String>,
    /// Number of transient dispatch retries consumed so far.
    pub retry_count: u32,
    /// Materialization timestamp.
    pub created_at: Timestamp,
    /// Timestamp of successful dispatch (`SENDING -> SENT`).
    pub sent_at: Option<Timestamp>,
    /// Timestamp of delivery confirmation.
    pub delivered_at: Option<Timestamp>,
}
