// messaging-core/tests/consent_service.rs
// ============================================================================
// Module: Consent Service Tests
// Description: Tests for keyword-driven consent transitions and stickiness.
// Purpose: Ensure STOP is sticky against START and admin re-opt-in is the
//          sole escape path.
// Dependencies: messaging-core, chrono
// ============================================================================

//! ## Overview
//! Drives [`ConsentService`] against an [`InMemoryStore`] to exercise
//! keyword parsing, stickiness, and the admin re-opt-in escape hatch.

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

use std::sync::Arc;

use chrono::Utc;
use messaging_core::AttributeBag;
use messaging_core::ConsentService;
use messaging_core::ConsentState;
use messaging_core::E164;
use messaging_core::InMemoryStore;
use messaging_core::Store;
use messaging_core::Timestamp;
use messaging_core::runtime::Eligibility;

fn seeded_service() -> (Arc<InMemoryStore>, ConsentService, E164, Timestamp) {
    let store = Arc::new(InMemoryStore::new());
    let now = Timestamp::from(Utc::now());
    let e164 = E164::parse("+15551234567").expect("valid e164");
    store.upsert_recipient(&e164, AttributeBag::new(), now).expect("upsert");
    let service = ConsentService::new(store.clone());
    (store, service, e164, now)
}

#[test]
fn fresh_recipient_defaults_to_opt_in_and_is_eligible() {
    let (_store, service, e164, _now) = seeded_service();
    assert_eq!(service.is_eligible(&e164), Ok(Eligibility::Ok));
}

#[test]
fn stop_keyword_blocks_eligibility() {
    let (store, service, e164, now) = seeded_service();
    let result = service.apply_inbound_keyword(&e164, "stop", now).expect("apply");
    assert_eq!(result, Some(ConsentState::Stop));
    assert_eq!(store.get_recipient(&e164).expect("get").expect("present").consent_state, ConsentState::Stop);
    assert_eq!(service.is_eligible(&e164), Ok(Eligibility::Blocked(ConsentState::Stop)));
}

#[test]
fn start_keyword_is_ignored_after_stop() {
    let (_store, service, e164, now) = seeded_service();
    service.apply_inbound_keyword(&e164, "STOP", now).expect("stop");
    let result = service.apply_inbound_keyword(&e164, "START", now).expect("start attempted");
    assert_eq!(result, None);
    assert_eq!(service.is_eligible(&e164), Ok(Eligibility::Blocked(ConsentState::Stop)));
}

#[test]
fn admin_reopt_in_is_the_sole_escape_from_stop() {
    let (_store, service, e164, now) = seeded_service();
    service.apply_inbound_keyword(&e164, "STOP", now).expect("stop");
    service.admin_reopt_in(&e164, "ops@example.com", now).expect("reopt in");
    assert_eq!(service.is_eligible(&e164), Ok(Eligibility::Ok));
}

#[test]
fn unrecognized_body_is_a_no_op() {
    let (_store, service, e164, now) = seeded_service();
    let result = service.apply_inbound_keyword(&e164, "hello there", now).expect("apply");
    assert_eq!(result, None);
}

#[test]
fn keyword_for_unknown_recipient_is_a_no_op() {
    let store = Arc::new(InMemoryStore::new());
    let service = ConsentService::new(store);
    let e164 = E164::parse("+15559998888").expect("valid e164");
    let now = Timestamp::from(Utc::now());
    let result = service.apply_inbound_keyword(&e164, "STOP", now).expect("apply");
    assert_eq!(result, None);
}
