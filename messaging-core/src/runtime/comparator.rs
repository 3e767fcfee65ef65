// messaging-core/src/runtime/comparator.rs
// ============================================================================
// Module: Segment Comparator Logic
// Description: Leaf-operator evaluation over a recipient's attribute bag.
// Purpose: Convert a rule leaf plus an attribute bag into a fail-closed bool.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Leaf evaluation is fail-closed: a missing attribute, a type mismatch, or
//! an un-parseable comparison value all evaluate to `false` rather than
//! raising an error. This keeps segment evaluation total over any attribute
//! bag shape the Store hands back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Number;
use serde_json::Value;

use crate::core::AttributeBag;
use crate::core::Operator;

// ============================================================================
// SECTION: Leaf Evaluation
// ============================================================================

/// Evaluates a single leaf condition against `attrs`.
#[must_use]
pub fn evaluate_leaf(attribute: &str, operator: Operator, value: Option<&Value>, attrs: &AttributeBag) -> bool {
    let found = attrs.get(attribute);
    match operator {
        Operator::Exists => found.is_some_and(|v| !v.is_null()),
        _ => evaluate_value_operator(operator, value, found),
    }
}

/// Evaluates the operators that compare an attribute's present value.
fn evaluate_value_operator(operator: Operator, expected: Option<&Value>, found: Option<&Value>) -> bool {
    let (Some(expected), Some(found)) = (expected, found) else {
        return false;
    };
    if found.is_null() {
        return false;
    }
    match operator {
        Operator::Equals => found == expected,
        Operator::NotEquals => found != expected,
        Operator::In => matches_in(found, expected, true),
        Operator::NotIn => matches_in(found, expected, false),
        Operator::Gt | Operator::Lt | Operator::Gte | Operator::Lte => {
            compare_numeric(operator, found, expected)
        }
        Operator::Matches => matches_regex(found, expected),
        Operator::Exists => false,
    }
}

/// Evaluates `in`/`not_in` membership against an array `expected` value.
fn matches_in(found: &Value, expected: &Value, want_member: bool) -> bool {
    let Value::Array(candidates) = expected else {
        return false;
    };
    let is_member = candidates.contains(found);
    is_member == want_member
}

/// Evaluates numeric ordering comparators. Non-numeric operands fail closed.
fn compare_numeric(operator: Operator, found: &Value, expected: &Value) -> bool {
    let (Some(found), Some(expected)) = (found.as_number(), expected.as_number()) else {
        return false;
    };
    let Some(ordering) = numeric_cmp(found, expected) else {
        return false;
    };
    match operator {
        Operator::Gt => ordering.is_gt(),
        Operator::Gte => ordering.is_ge(),
        Operator::Lt => ordering.is_lt(),
        Operator::Lte => ordering.is_le(),
        _ => false,
    }
}

/// Evaluates an anchored regular-expression match against a string operand.
fn matches_regex(found: &Value, expected: &Value) -> bool {
    let (Value::String(found), Value::String(pattern)) = (found, expected) else {
        return false;
    };
    let anchored = format!("^(?:{pattern})$");
    regex::Regex::new(&anchored).is_ok_and(|re| re.is_match(found))
}

/// Compares two JSON numbers as `f64`, the only representation both integer
/// and decimal attribute values share.
fn numeric_cmp(left: &Number, right: &Number) -> Option<std::cmp::Ordering> {
    let left = left.as_f64()?;
    let right = right.as_f64()?;
    left.partial_cmp(&right)
}
