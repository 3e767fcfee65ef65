// messaging-core/tests/recipient.rs
// ============================================================================
// Module: Recipient Tests
// Description: Tests for E.164 parsing, consent stickiness, and attribute
//              merging.
// Purpose: Ensure recipient invariants hold across edge-case inputs.
// Dependencies: messaging-core
// ============================================================================

//! ## Overview
//! Validates E.164 parsing boundaries, the STOP-stickiness invariant, and
//! last-write-wins attribute merging.

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

use messaging_core::ConsentState;
use messaging_core::E164;
use messaging_core::E164Error;
use messaging_core::merge_attributes;

#[test]
fn e164_accepts_valid_numbers() {
    assert!(E164::parse("+15551234567").is_ok());
    assert!(E164::parse("+447911123456").is_ok());
}

#[test]
fn e164_rejects_missing_plus() {
    assert_eq!(E164::parse("15551234567"), Err(E164Error::MissingPlus("15551234567".to_string())));
}

#[test]
fn e164_rejects_non_digit() {
    assert!(matches!(E164::parse("+1555abc4567"), Err(E164Error::NonDigit(_))));
}

#[test]
fn e164_rejects_out_of_range_digit_counts() {
    assert!(matches!(E164::parse("+1234567"), Err(E164Error::BadDigitCount(7))));
    assert!(matches!(E164::parse("+1234567890123456"), Err(E164Error::BadDigitCount(16))));
}

#[test]
fn consent_stop_is_sticky_against_opt_in() {
    assert!(!ConsentState::Stop.keyword_transition_allowed(ConsentState::OptIn));
    assert!(ConsentState::Stop.keyword_transition_allowed(ConsentState::Stop));
}

#[test]
fn consent_opt_out_may_return_to_opt_in() {
    assert!(ConsentState::OptOut.keyword_transition_allowed(ConsentState::OptIn));
}

#[test]
fn merge_attributes_is_last_write_wins() {
    let mut base = messaging_core::AttributeBag::new();
    base.insert("plan".to_string(), serde_json::json!("free"));
    base.insert("region".to_string(), serde_json::json!("us"));

    let mut incoming = messaging_core::AttributeBag::new();
    incoming.insert("plan".to_string(), serde_json::json!("pro"));

    merge_attributes(&mut base, incoming);

    assert_eq!(base.get("plan"), Some(&serde_json::json!("pro")));
    assert_eq!(base.get("region"), Some(&serde_json::json!("us")));
}
