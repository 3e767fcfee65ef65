// messaging-core/tests/campaign.rs
// ============================================================================
// Module: Campaign Tests
// Description: Tests for the campaign lifecycle state machine and quiet
//              hours window, including the overnight wraparound case.
// Purpose: Ensure illegal transitions are rejected and overnight windows
//          are evaluated correctly.
// Dependencies: messaging-core, chrono, chrono-tz
// ============================================================================

//! ## Overview
//! Covers the full lifecycle DAG and the quiet-hours overnight edge case.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use chrono::NaiveTime;
use chrono_tz::Tz;
use messaging_core::Campaign;
use messaging_core::CampaignId;
use messaging_core::CampaignStatus;
use messaging_core::QuietHours;
use messaging_core::SegmentId;
use messaging_core::TemplateId;
use messaging_core::TopicId;

fn draft_campaign() -> Campaign {
    Campaign {
        id: CampaignId::new("camp-1"),
        topic: TopicId::new("topic-1"),
        template_id: TemplateId::new("tmpl-1"),
        segment_id: SegmentId::new("seg-1"),
        schedule_time: None,
        status: CampaignStatus::Draft,
        rate_limit_per_second: 5,
        default_quiet_hours: QuietHours {
            start: NaiveTime::from_hms_opt(21, 0, 0).expect("valid time"),
            end: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
            timezone: "America/Los_Angeles".parse::<Tz>().expect("valid tz"),
        },
        materialization_cursor: None,
        materialization_complete: false,
    }
}

#[test]
fn lifecycle_happy_path() {
    let mut c = draft_campaign();
    assert!(c.transition(CampaignStatus::Ready).is_ok());
    assert!(c.transition(CampaignStatus::Running).is_ok());
    assert!(c.transition(CampaignStatus::Paused).is_ok());
    assert!(c.transition(CampaignStatus::Running).is_ok());
    assert!(c.transition(CampaignStatus::Completed).is_ok());
}

#[test]
fn draft_cannot_skip_to_running() {
    let mut c = draft_campaign();
    assert_eq!(c.transition(CampaignStatus::Running), Err(CampaignStatus::Running));
}

#[test]
fn completed_is_terminal() {
    let mut c = draft_campaign();
    c.transition(CampaignStatus::Ready).expect("ready");
    c.transition(CampaignStatus::Running).expect("running");
    c.transition(CampaignStatus::Completed).expect("completed");
    assert_eq!(c.transition(CampaignStatus::Running), Err(CampaignStatus::Running));
}

#[test]
fn any_active_status_may_fail() {
    for start in [CampaignStatus::Draft, CampaignStatus::Ready, CampaignStatus::Running, CampaignStatus::Paused] {
        assert!(start.can_transition_to(CampaignStatus::Failed));
    }
    assert!(!CampaignStatus::Completed.can_transition_to(CampaignStatus::Failed));
}

#[test]
fn overnight_window_wraps_past_midnight() {
    let window = QuietHours {
        start: NaiveTime::from_hms_opt(21, 0, 0).expect("valid time"),
        end: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
        timezone: "UTC".parse::<Tz>().expect("valid tz"),
    };
    assert!(window.overnight());
    assert!(window.contains(NaiveTime::from_hms_opt(23, 0, 0).expect("valid time")));
    assert!(window.contains(NaiveTime::from_hms_opt(3, 0, 0).expect("valid time")));
    assert!(!window.contains(NaiveTime::from_hms_opt(12, 0, 0).expect("valid time")));
}

#[test]
fn same_day_window_does_not_wrap() {
    let window = QuietHours {
        start: NaiveTime::from_hms_opt(9, 0, 0).expect("valid time"),
        end: NaiveTime::from_hms_opt(17, 0, 0).expect("valid time"),
        timezone: "UTC".parse::<Tz>().expect("valid tz"),
    };
    assert!(!window.overnight());
    assert!(window.contains(NaiveTime::from_hms_opt(12, 0, 0).expect("valid time")));
    assert!(!window.contains(NaiveTime::from_hms_opt(20, 0, 0).expect("valid time")));
}
