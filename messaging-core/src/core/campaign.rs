// messaging-core/src/core/campaign.rs
// ============================================================================
// Module: Campaign
// Description: Campaign identity, schedule, rate limit, and quiet-hour window.
// Purpose: Provide the canonical Campaign entity and its lifecycle states.
// Dependencies: chrono, chrono-tz, serde
// ============================================================================

//! ## Overview
//! A campaign binds a topic, template, and segment together with a rate
//! limit and a quiet-hour window, and drives through the lifecycle state
//! machine documented on [`CampaignStatus`]. The six-stage per-message
//! compliance pipeline lives in [`crate::runtime::CampaignOrchestrator`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::CampaignId;
use crate::core::identifiers::SegmentId;
use crate::core::identifiers::TemplateId;
use crate::core::identifiers::TopicId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Campaign Status
// ============================================================================

/// Campaign lifecycle state.
///
/// ```text
/// DRAFT --trigger--> READY --start--> RUNNING --drain--> COMPLETED
///   |                   |                 |
///   |                   +--pause--> PAUSED --resume--+
///   +---------------any terminal error-------------------> FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    /// Not yet ready to run.
    Draft,
    /// Ready to be triggered.
    Ready,
    /// Materializing and/or dispatching messages.
    Running,
    /// Paused; in-flight dispatches complete but no new stages are scheduled.
    Paused,
    /// Every materialized message has reached a terminal status and
    /// materialization has drained.
    Completed,
    /// An unrecoverable Store-level error escalated to the campaign.
    Failed,
}

impl CampaignStatus {
    /// Returns true if `to` is a legal transition from `self`.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        use CampaignStatus::{Completed, Draft, Failed, Paused, Ready, Running};
        matches!(
            (self, to),
            (Draft, Ready)
                | (Ready, Running)
                | (Running, Paused)
                | (Paused, Running)
                | (Running, Completed)
                | (Draft, Failed)
                | (Ready, Failed)
                | (Running, Failed)
                | (Paused, Failed)
        )
    }
}

// ============================================================================
// SECTION: Quiet Hours
// ============================================================================

/// A wall-clock quiet-hour window interpreted in a named IANA time zone.
/// When `end < start` the window wraps past midnight (`overnight`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietHours {
    /// Window start, local wall-clock time.
    pub start: NaiveTime,
    /// Window end, local wall-clock time.
    pub end: NaiveTime,
    /// Time zone the window is interpreted in.
    pub timezone: Tz,
}

impl QuietHours {
    /// Returns true when the window wraps past local midnight.
    #[must_use]
    pub fn overnight(&self) -> bool {
        self.end < self.start
    }

    /// Returns true when `local_time` falls inside the quiet window.
    #[must_use]
    pub fn contains(&self, local_time: NaiveTime) -> bool {
        if self.overnight() {
            local_time >= self.start || local_time < self.end
        } else {
            local_time >= self.start && local_time < self.end
        }
    }
}

// ============================================================================
// SECTION: Campaign
// ============================================================================

/// A campaign row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Campaign identity.
    pub id: CampaignId,
    /// Subscription topic this campaign addresses.
    pub topic: TopicId,
    /// Template used to render each message.
    pub template_id: TemplateId,
    /// Segment resolved to determine recipients.
    pub segment_id: SegmentId,
    /// Optional scheduled trigger instant.
    pub schedule_time: Option<Timestamp>,
    /// Current lifecycle status.
    pub status: CampaignStatus,
    /// Outbound rate limit, messages per second, at least 1.
    pub rate_limit_per_second: u32,
    /// Quiet-hour window applied when the recipient has no `timezone`
    /// attribute of their own.
    pub default_quiet_hours: QuietHours,
    /// Opaque cursor into the SegmentEvaluator's recipient stream, persisted
    /// so materialization can resume after a crash (§8 scenario S6).
    pub materialization_cursor: Option<String>,
    /// True once the SegmentEvaluator's stream has been fully consumed.
    pub materialization_complete: bool,
}

impl Campaign {
    /// Attempts the lifecycle transition `self.status -> to`.
    ///
    /// # Errors
    ///
    /// Returns the rejected target status when the transition is not legal.
    pub fn transition(&mut self, to: CampaignStatus) -> Result<(), CampaignStatus> {
        if !self.status.can_transition_to(to) {
            return Err(to);
        }
        self.status = to;
        Ok(())
    }
}
