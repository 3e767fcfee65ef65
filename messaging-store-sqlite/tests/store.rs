// messaging-store-sqlite/tests/store.rs
// ============================================================================
// Module: SQLite Store Tests
// Description: Exercises SqliteStore against the same Store contract the
//              in-memory implementation satisfies.
// Purpose: Verify recipients, consent, messages, audit, campaigns, and
//          segment matching round-trip through a real SQLite file.
// Dependencies: messaging-store-sqlite, messaging-core, tempfile, chrono
// ============================================================================

//! ## Overview
//! Each test opens a fresh `SQLite` database under a `tempfile::TempDir` so
//! tests never share file-level state, then drives [`SqliteStore`] through
//! the same [`Store`] trait the orchestrator uses.

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

use chrono::Utc;
use messaging_core::AttributeBag;
use messaging_core::AuditId;
use messaging_core::AuditKind;
use messaging_core::AuditRecord;
use messaging_core::AuditSubject;
use messaging_core::Campaign;
use messaging_core::CampaignId;
use messaging_core::CampaignStatus;
use messaging_core::ConsentState;
use messaging_core::Cursor;
use messaging_core::E164;
use messaging_core::MessageStatus;
use messaging_core::MessageTransitionFields;
use messaging_core::Operator;
use messaging_core::QuietHours;
use messaging_core::RuleNode;
use messaging_core::Segment;
use messaging_core::SegmentId;
use messaging_core::Store;
use messaging_core::StoreError;
use messaging_core::Template;
use messaging_core::TemplateId;
use messaging_core::Timestamp;
use messaging_core::TopicId;
use messaging_store_sqlite::SqliteStore;

fn open_store() -> (tempfile::TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("messaging.sqlite3");
    let store = SqliteStore::open(&messaging_store_sqlite::SqliteStoreConfig::new(path)).expect("open");
    (dir, store)
}

fn now() -> Timestamp {
    Timestamp::from(Utc::now())
}

#[test]
fn recipient_round_trips_through_upsert_and_get() {
    let (_dir, store) = open_store();
    let e164 = E164::parse("+15551234567").expect("valid e164");
    let mut attrs = AttributeBag::new();
    attrs.insert("plan".to_string(), serde_json::json!("pro"));
    store.upsert_recipient(&e164, attrs, now()).expect("upsert");

    let recipient = store.get_recipient(&e164).expect("get").expect("present");
    assert_eq!(recipient.consent_state, ConsentState::OptIn);
    assert_eq!(recipient.attributes.get("plan"), Some(&serde_json::json!("pro")));
}

#[test]
fn upsert_recipient_merges_attributes_last_write_wins() {
    let (_dir, store) = open_store();
    let e164 = E164::parse("+15551234567").expect("valid e164");
    let mut first = AttributeBag::new();
    first.insert("plan".to_string(), serde_json::json!("free"));
    first.insert("region".to_string(), serde_json::json!("us"));
    store.upsert_recipient(&e164, first, now()).expect("first upsert");

    let mut second = AttributeBag::new();
    second.insert("plan".to_string(), serde_json::json!("pro"));
    store.upsert_recipient(&e164, second, now()).expect("second upsert");

    let recipient = store.get_recipient(&e164).expect("get").expect("present");
    assert_eq!(recipient.attributes.get("plan"), Some(&serde_json::json!("pro")));
    assert_eq!(recipient.attributes.get("region"), Some(&serde_json::json!("us")));
}

#[test]
fn update_consent_returns_prior_state_and_persists_new_state() {
    let (_dir, store) = open_store();
    let e164 = E164::parse("+15551234567").expect("valid e164");
    store.upsert_recipient(&e164, AttributeBag::new(), now()).expect("upsert");

    let prior = store.update_consent(&e164, ConsentState::Stop, "keyword", now()).expect("update");
    assert_eq!(prior, ConsentState::OptIn);
    assert_eq!(store.get_recipient(&e164).expect("get").expect("present").consent_state, ConsentState::Stop);
}

#[test]
fn update_consent_on_unknown_recipient_is_not_found() {
    let (_dir, store) = open_store();
    let e164 = E164::parse("+15551234567").expect("valid e164");
    let err = store.update_consent(&e164, ConsentState::Stop, "keyword", now()).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn message_lifecycle_transitions_and_rejects_stale_compare_and_set() {
    let (_dir, store) = open_store();
    let campaign_id = CampaignId::new("camp-1");
    let e164 = E164::parse("+15551234567").expect("valid e164");
    let message_id = store.create_message(&campaign_id, &e164, "Hi Ada", now()).expect("create");

    let message = store.get_message(&message_id).expect("get").expect("present");
    assert_eq!(message.status, MessageStatus::Queued);
    assert_eq!(message.retry_count, 0);

    store
        .transition_message(
            &message_id,
            MessageStatus::Queued,
            MessageStatus::Sent,
            MessageTransitionFields {
                provider_sid: Some("SID1".to_string()),
                error_code: None,
                increment_retry: false,
                at: now(),
            },
        )
        .expect("transition");

    let message = store.get_message(&message_id).expect("get").expect("present");
    assert_eq!(message.status, MessageStatus::Sent);
    assert_eq!(message.provider_sid.as_deref(), Some("SID1"));

    let stale = store.transition_message(
        &message_id,
        MessageStatus::Queued,
        MessageStatus::Failed,
        MessageTransitionFields::default(),
    );
    assert!(matches!(stale, Err(StoreError::TransitionConflict(_))));
}

#[test]
fn transition_message_increments_retry_count_when_requested() {
    let (_dir, store) = open_store();
    let campaign_id = CampaignId::new("camp-1");
    let e164 = E164::parse("+15551234567").expect("valid e164");
    let message_id = store.create_message(&campaign_id, &e164, "Hi Ada", now()).expect("create");

    store
        .transition_message(
            &message_id,
            MessageStatus::Queued,
            MessageStatus::Queued,
            MessageTransitionFields { increment_retry: true, at: now(), ..Default::default() },
        )
        .expect("retry transition");

    let message = store.get_message(&message_id).expect("get").expect("present");
    assert_eq!(message.retry_count, 1);
}

#[test]
fn find_message_by_provider_sid_locates_the_message() {
    let (_dir, store) = open_store();
    let campaign_id = CampaignId::new("camp-1");
    let e164 = E164::parse("+15551234567").expect("valid e164");
    let message_id = store.create_message(&campaign_id, &e164, "Hi Ada", now()).expect("create");
    store
        .transition_message(
            &message_id,
            MessageStatus::Queued,
            MessageStatus::Sent,
            MessageTransitionFields {
                provider_sid: Some("SID-XYZ".to_string()),
                at: now(),
                ..Default::default()
            },
        )
        .expect("transition");

    let found = store.find_message_by_provider_sid("SID-XYZ").expect("lookup").expect("present");
    assert_eq!(found.id, message_id);
}

#[test]
fn list_non_terminal_messages_excludes_terminal_statuses() {
    let (_dir, store) = open_store();
    let campaign_id = CampaignId::new("camp-1");
    let e164 = E164::parse("+15551234567").expect("valid e164");
    let pending = store.create_message(&campaign_id, &e164, "Hi Ada", now()).expect("create");
    let terminal = store.create_message(&campaign_id, &e164, "Hi Ada", now()).expect("create");
    store
        .transition_message(&terminal, MessageStatus::Queued, MessageStatus::Failed, MessageTransitionFields {
            at: now(),
            ..Default::default()
        })
        .expect("fail it");

    let non_terminal = store.list_non_terminal_messages(&campaign_id).expect("list");
    assert_eq!(non_terminal, vec![pending]);
}

#[test]
fn campaign_round_trips_and_materialization_progress_persists() {
    let (_dir, store) = open_store();
    let campaign = Campaign {
        id: CampaignId::new("camp-1"),
        topic: TopicId::new("topic-1"),
        template_id: TemplateId::new("tmpl-1"),
        segment_id: SegmentId::new("seg-1"),
        schedule_time: None,
        status: CampaignStatus::Draft,
        rate_limit_per_second: 5,
        default_quiet_hours: QuietHours {
            start: chrono::NaiveTime::from_hms_opt(21, 0, 0).expect("valid"),
            end: chrono::NaiveTime::from_hms_opt(8, 0, 0).expect("valid"),
            timezone: "UTC".parse().expect("valid"),
        },
        materialization_cursor: None,
        materialization_complete: false,
    };
    store.upsert_campaign(&campaign).expect("upsert");

    store.save_materialization_progress(&campaign.id, Cursor(Some("+15551234567".to_string())), false).expect("save");
    let reloaded = store.get_campaign(&campaign.id).expect("get").expect("present");
    assert_eq!(reloaded.materialization_cursor.as_deref(), Some("+15551234567"));
    assert!(!reloaded.materialization_complete);
    assert_eq!(reloaded.rate_limit_per_second, 5);
}

#[test]
fn audit_records_list_in_insertion_order_for_their_subject() {
    let (_dir, store) = open_store();
    let campaign_id = CampaignId::new("camp-1");
    let subject = AuditSubject::Campaign(campaign_id.clone());
    for index in 0..3 {
        store
            .append_audit(AuditRecord {
                id: AuditId::new(format!("audit-{index}")),
                kind: AuditKind::CampaignTransition,
                subject: subject.clone(),
                detail: serde_json::json!({ "index": index }),
                at: now(),
            })
            .expect("append");
    }

    let records = store.list_audit(&subject).expect("list");
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].detail, serde_json::json!({ "index": 0 }));
    assert_eq!(records[2].detail, serde_json::json!({ "index": 2 }));

    let other_subject = AuditSubject::Campaign(CampaignId::new("camp-2"));
    assert!(store.list_audit(&other_subject).expect("list").is_empty());
}

#[test]
fn list_recipients_matching_synthesizes_consent_state_and_paginates() {
    let (_dir, store) = open_store();
    let segment = Segment {
        id: SegmentId::new("seg-1"),
        name: "pro-plan".to_string(),
        rule: RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Equals, value: Some(serde_json::json!("pro")) },
    };
    store.put_segment(&segment).expect("seed segment");

    for index in 0..5 {
        let e164 = E164::parse(&format!("+1555000{index:04}")).expect("valid e164");
        let mut attrs = AttributeBag::new();
        attrs.insert("plan".to_string(), serde_json::json!(if index % 2 == 0 { "pro" } else { "free" }));
        store.upsert_recipient(&e164, attrs, now()).expect("seed recipient");
    }
    let stopped = E164::parse("+15550000006").expect("valid e164");
    let mut attrs = AttributeBag::new();
    attrs.insert("plan".to_string(), serde_json::json!("pro"));
    store.upsert_recipient(&stopped, attrs, now()).expect("seed stopped recipient");
    store.update_consent(&stopped, ConsentState::Stop, "keyword", now()).expect("stop");

    let page = store.list_recipients_matching(&segment.rule, Cursor(None), 100).expect("match");
    assert_eq!(page.recipients.len(), 4);
    assert_eq!(page.next_cursor, Cursor(None));

    let consent_rule = RuleNode::Leaf {
        attribute: messaging_core::CONSENT_STATE_ATTRIBUTE.to_string(),
        operator: Operator::Equals,
        value: Some(serde_json::json!("STOP")),
    };
    let stopped_page = store.list_recipients_matching(&consent_rule, Cursor(None), 100).expect("match");
    assert_eq!(stopped_page.recipients, vec![stopped]);
}

#[test]
fn list_recipients_matching_resumes_from_cursor() {
    let (_dir, store) = open_store();
    let rule = RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Exists, value: None };
    for index in 0..3 {
        let e164 = E164::parse(&format!("+1555000{index:04}")).expect("valid e164");
        let mut attrs = AttributeBag::new();
        attrs.insert("plan".to_string(), serde_json::json!("pro"));
        store.upsert_recipient(&e164, attrs, now()).expect("seed recipient");
    }

    let first_page = store.list_recipients_matching(&rule, Cursor(None), 2).expect("first page");
    assert_eq!(first_page.recipients.len(), 2);
    assert_ne!(first_page.next_cursor, Cursor(None));

    let second_page = store.list_recipients_matching(&rule, first_page.next_cursor, 2).expect("second page");
    assert_eq!(second_page.recipients.len(), 1);
    assert_eq!(second_page.next_cursor, Cursor(None));
}

#[test]
fn template_and_segment_lookup_round_trip() {
    let (_dir, store) = open_store();
    let template = Template {
        id: TemplateId::new("tmpl-1"),
        content: "Hi {name}".to_string(),
        variables: ["name".to_string()].into_iter().collect(),
        channel: "sms".to_string(),
        locale: "en-US".to_string(),
    };
    store.put_template(&template).expect("seed");
    let reloaded = store.get_template(&template.id).expect("get").expect("present");
    assert_eq!(reloaded.content, "Hi {name}");

    assert!(store.get_template(&TemplateId::new("missing")).expect("get").is_none());
    assert!(store.get_segment(&SegmentId::new("missing")).expect("get").is_none());
}

#[test]
fn store_survives_reopen_against_the_same_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("messaging.sqlite3");
    let e164 = E164::parse("+15551234567").expect("valid e164");

    {
        let store = SqliteStore::open(&messaging_store_sqlite::SqliteStoreConfig::new(&path)).expect("open");
        store.upsert_recipient(&e164, AttributeBag::new(), now()).expect("seed");
    }

    let reopened = SqliteStore::open(&messaging_store_sqlite::SqliteStoreConfig::new(&path)).expect("reopen");
    assert!(reopened.get_recipient(&e164).expect("get").is_some());
}
