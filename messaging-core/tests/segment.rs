// messaging-core/tests/segment.rs
// ============================================================================
// Module: Segment Tests
// Description: Tests for rule-tree parsing/validation and leaf evaluation.
// Purpose: Ensure the closed grammar rejects malformed shapes at parse time
//          and that evaluation is fail-closed.
// Dependencies: messaging-core
// ============================================================================

//! ## Overview
//! Covers parse-time validation of the segment DSL and operator semantics,
//! including the implicit consent filter and fail-closed comparisons.

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

use messaging_core::AttributeBag;
use messaging_core::Logic;
use messaging_core::Operator;
use messaging_core::RuleNode;
use messaging_core::SegmentError;
use messaging_core::runtime::segment_evaluator::evaluate;
use serde_json::json;

#[test]
fn parse_rejects_empty_composite() {
    let raw = json!({ "logic": "AND", "conditions": [] });
    assert_eq!(RuleNode::parse(&raw), Err(SegmentError::EmptyComposite));
}

#[test]
fn parse_rejects_missing_value_for_equals() {
    let raw = json!({ "attribute": "plan", "operator": "equals" });
    assert_eq!(RuleNode::parse(&raw), Err(SegmentError::MissingValue(Operator::Equals)));
}

#[test]
fn parse_rejects_non_array_value_for_in() {
    let raw = json!({ "attribute": "plan", "operator": "in", "value": "pro" });
    assert_eq!(RuleNode::parse(&raw), Err(SegmentError::ValueNotArray(Operator::In)));
}

#[test]
fn parse_allows_exists_without_value() {
    let raw = json!({ "attribute": "plan", "operator": "exists" });
    let parsed = RuleNode::parse(&raw).expect("parse");
    assert_eq!(
        parsed,
        RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Exists, value: None }
    );
}

#[test]
fn implicit_consent_filter_wraps_root_in_and() {
    let rule = RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Exists, value: None };
    let wrapped = rule.with_implicit_consent_filter();
    match wrapped {
        RuleNode::Composite { logic: Logic::And, conditions } => assert_eq!(conditions.len(), 2),
        other => panic!("expected AND composite, got {other:?}"),
    }
}

fn attrs_with(pairs: &[(&str, serde_json::Value)]) -> AttributeBag {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}

#[test]
fn evaluate_equals_and_not_equals() {
    let attrs = attrs_with(&[("plan", json!("pro"))]);
    let eq = RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Equals, value: Some(json!("pro")) };
    let neq = RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::NotEquals, value: Some(json!("free")) };
    assert!(evaluate(&eq, &attrs));
    assert!(evaluate(&neq, &attrs));
}

#[test]
fn evaluate_missing_attribute_is_fail_closed() {
    let attrs = AttributeBag::new();
    let leaf = RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Equals, value: Some(json!("pro")) };
    assert!(!evaluate(&leaf, &attrs));
}

#[test]
fn evaluate_gt_requires_numeric_operands() {
    let attrs = attrs_with(&[("age", json!("not-a-number"))]);
    let leaf = RuleNode::Leaf { attribute: "age".to_string(), operator: Operator::Gt, value: Some(json!(18)) };
    assert!(!evaluate(&leaf, &attrs));
}

#[test]
fn evaluate_gt_compares_numbers() {
    let attrs = attrs_with(&[("age", json!(21))]);
    let leaf = RuleNode::Leaf { attribute: "age".to_string(), operator: Operator::Gt, value: Some(json!(18)) };
    assert!(evaluate(&leaf, &attrs));
}

#[test]
fn evaluate_matches_is_anchored() {
    let attrs = attrs_with(&[("code", json!("AB-123"))]);
    let leaf = RuleNode::Leaf {
        attribute: "code".to_string(),
        operator: Operator::Matches,
        value: Some(json!(r"[A-Z]{2}-\d{3}")),
    };
    assert!(evaluate(&leaf, &attrs));

    let partial_attrs = attrs_with(&[("code", json!("xxAB-123xx"))]);
    assert!(!evaluate(&leaf, &partial_attrs));
}

#[test]
fn evaluate_composite_and_or() {
    let attrs = attrs_with(&[("plan", json!("pro")), ("region", json!("us"))]);
    let and_rule = RuleNode::Composite {
        logic: Logic::And,
        conditions: vec![
            RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Equals, value: Some(json!("pro")) },
            RuleNode::Leaf { attribute: "region".to_string(), operator: Operator::Equals, value: Some(json!("us")) },
        ],
    };
    assert!(evaluate(&and_rule, &attrs));

    let or_rule = RuleNode::Composite {
        logic: Logic::Or,
        conditions: vec![
            RuleNode::Leaf { attribute: "plan".to_string(), operator: Operator::Equals, value: Some(json!("free")) },
            RuleNode::Leaf { attribute: "region".to_string(), operator: Operator::Equals, value: Some(json!("us")) },
        ],
    };
    assert!(evaluate(&or_rule, &attrs));
}
