// messaging-core/tests/message.rs
// ============================================================================
// Module: Message Status Tests
// Description: Tests for the message status DAG and status-callback table.
// Purpose: Ensure terminal statuses never regress and out-of-order
//          callbacks are absorbed rather than rejected.
// Dependencies: messaging-core
// ============================================================================

//! ## Overview
//! Exercises every cell of the §4.7 status-callback transition table.

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

use messaging_core::CallbackKind;
use messaging_core::MessageStatus;

#[test]
fn terminal_statuses_are_identified() {
    assert!(MessageStatus::Read.is_terminal());
    assert!(MessageStatus::Failed.is_terminal());
    assert!(MessageStatus::Undelivered.is_terminal());
    assert!(!MessageStatus::Queued.is_terminal());
    assert!(!MessageStatus::Sent.is_terminal());
}

#[test]
fn queued_callback_never_advances_a_known_message() {
    assert_eq!(CallbackKind::Queued.target_for(MessageStatus::Queued), None);
    assert_eq!(CallbackKind::Queued.target_for(MessageStatus::Sending), None);
}

#[test]
fn sent_callback_advances_queued_and_sending() {
    assert_eq!(CallbackKind::Sent.target_for(MessageStatus::Queued), Some(MessageStatus::Sent));
    assert_eq!(CallbackKind::Sent.target_for(MessageStatus::Sending), Some(MessageStatus::Sent));
    assert_eq!(CallbackKind::Sent.target_for(MessageStatus::Sent), None);
}

#[test]
fn out_of_order_delivered_before_sent_is_accepted() {
    assert_eq!(CallbackKind::Delivered.target_for(MessageStatus::Queued), Some(MessageStatus::Delivered));
}

#[test]
fn delivered_to_delivered_is_a_no_op() {
    assert_eq!(CallbackKind::Delivered.target_for(MessageStatus::Delivered), None);
}

#[test]
fn late_failure_after_delivered_is_ignored() {
    assert_eq!(CallbackKind::Failed.target_for(MessageStatus::Delivered), None);
    assert_eq!(CallbackKind::Undelivered.target_for(MessageStatus::Delivered), None);
}

#[test]
fn read_advances_from_any_non_terminal_status() {
    assert_eq!(CallbackKind::Read.target_for(MessageStatus::Queued), Some(MessageStatus::Read));
    assert_eq!(CallbackKind::Read.target_for(MessageStatus::Sending), Some(MessageStatus::Read));
    assert_eq!(CallbackKind::Read.target_for(MessageStatus::Sent), Some(MessageStatus::Read));
    assert_eq!(CallbackKind::Read.target_for(MessageStatus::Delivered), Some(MessageStatus::Read));
}

#[test]
fn terminal_statuses_absorb_every_callback() {
    for status in [MessageStatus::Read, MessageStatus::Failed, MessageStatus::Undelivered] {
        for kind in [
            CallbackKind::Queued,
            CallbackKind::Sent,
            CallbackKind::Delivered,
            CallbackKind::Read,
            CallbackKind::Failed,
            CallbackKind::Undelivered,
        ] {
            assert_eq!(kind.target_for(status), None, "{kind:?} into terminal {status:?} must be a no-op");
        }
    }
}

#[test]
fn parse_is_case_insensitive() {
    assert_eq!(CallbackKind::parse("DELIVERED"), Some(CallbackKind::Delivered));
    assert_eq!(CallbackKind::parse("Delivered"), Some(CallbackKind::Delivered));
    assert_eq!(CallbackKind::parse("bogus"), None);
}
