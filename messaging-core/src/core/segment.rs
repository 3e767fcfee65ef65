// messaging-core/src/core/segment.rs
// ============================================================================
// Module: Segment Rule Tree
// Description: Closed tagged-variant rule tree for recipient segmentation.
// Purpose: Parse and validate the untyped JSON segment DSL into a typed tree.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The segment DSL is expressed at the boundary as untyped JSON. This module
//! parses it into a closed tagged-variant tree (`Leaf | And | Or`) with
//! validated operator and value shapes, rejecting unknown tags at parse time
//! rather than evaluation time. Evaluation against a recipient's attribute
//! bag lives in [`crate::runtime::segment_evaluator`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::SegmentId;

// ============================================================================
// SECTION: Reserved Attribute
// ============================================================================

/// The reserved attribute name bound to the Recipient's consent column
/// rather than its open attribute bag.
pub const CONSENT_STATE_ATTRIBUTE: &str = "consent_state";

// ============================================================================
// SECTION: Operator
// ============================================================================

/// Leaf comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Attribute value equals the leaf value.
    Equals,
    /// Attribute value does not equal the leaf value.
    NotEquals,
    /// Attribute value is a member of the leaf array value.
    In,
    /// Attribute value is not a member of the leaf array value.
    NotIn,
    /// Attribute is present and non-null.
    Exists,
    /// Attribute value, parsed as a number, is greater than the leaf value.
    Gt,
    /// Attribute value, parsed as a number, is less than the leaf value.
    Lt,
    /// Attribute value, parsed as a number, is greater than or equal.
    Gte,
    /// Attribute value, parsed as a number, is less than or equal.
    Lte,
    /// Attribute value, as a string, matches the leaf value as an anchored
    /// regular expression.
    Matches,
}

// ============================================================================
// SECTION: Logic
// ============================================================================

/// Composite boolean combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    /// All child conditions must hold.
    And,
    /// At least one child condition must hold.
    Or,
}

// ============================================================================
// SECTION: Untyped Wire Shape
// ============================================================================

/// Untyped wire representation of a rule node, as it appears in Segment JSON.
/// Exactly one of the leaf fields or the composite fields must be present;
/// [`RuleNode::parse`] rejects any other shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireNode {
    /// Composite node: `{logic, conditions}`.
    Composite {
        /// `AND` or `OR`.
        logic: Logic,
        /// Child nodes.
        conditions: Vec<WireNode>,
    },
    /// Leaf node: `{attribute, operator, value}`.
    Leaf {
        /// Attribute name being compared.
        attribute: String,
        /// Comparison operator.
        operator: Operator,
        /// Comparison value. Absent for `exists`.
        #[serde(default)]
        value: Option<Value>,
    },
}

// ============================================================================
// SECTION: Typed Rule Tree
// ============================================================================

/// A validated, closed rule tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuleNode {
    /// A leaf condition over a single attribute.
    Leaf {
        /// Attribute name.
        attribute: String,
        /// Comparison operator.
        operator: Operator,
        /// Comparison value, required for every operator except `exists`.
        value: Option<Value>,
    },
    /// A composite of child conditions joined by `AND` or `OR`.
    Composite {
        /// Combinator.
        logic: Logic,
        /// Child nodes; must be non-empty.
        conditions: Vec<RuleNode>,
    },
}

/// Errors returned when parsing or validating a rule tree.
#[derive(Debug, Error, PartialEq)]
pub enum SegmentError {
    /// The node shape did not match any variant of the closed grammar.
    #[error("malformed rule node: {0}")]
    MalformedNode(String),
    /// A composite node declared zero child conditions.
    #[error("composite node must have at least one condition")]
    EmptyComposite,
    /// An operator other than `exists`/`not_exists`-style required a value
    /// but none was supplied.
    #[error("operator {0:?} requires a value")]
    MissingValue(Operator),
    /// `in`/`not_in` requires an array value.
    #[error("operator {0:?} requires an array value")]
    ValueNotArray(Operator),
    /// The JSON failed to parse as a wire node at all.
    #[error("invalid rule json: {0}")]
    InvalidJson(String),
}

impl RuleNode {
    /// Parses and validates a rule tree from its untyped JSON representation.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError`] when the JSON does not conform to the closed
    /// grammar described in the module overview.
    pub fn parse(raw: &Value) -> Result<Self, SegmentError> {
        let wire: WireNode =
            serde_json::from_value(raw.clone()).map_err(|e| SegmentError::InvalidJson(e.to_string()))?;
        Self::from_wire(wire)
    }

    /// Converts a parsed wire node into the validated typed tree.
    fn from_wire(wire: WireNode) -> Result<Self, SegmentError> {
        match wire {
            WireNode::Composite { logic, conditions } => {
                if conditions.is_empty() {
                    return Err(SegmentError::EmptyComposite);
                }
                let conditions = conditions
                    .into_iter()
                    .map(Self::from_wire)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Composite { logic, conditions })
            }
            WireNode::Leaf {
                attribute,
                operator,
                value,
            } => {
                if operator == Operator::Exists {
                    return Ok(Self::Leaf {
                        attribute,
                        operator,
                        value: None,
                    });
                }
                let Some(value) = value else {
                    return Err(SegmentError::MissingValue(operator));
                };
                if matches!(operator, Operator::In | Operator::NotIn) && !value.is_array() {
                    return Err(SegmentError::ValueNotArray(operator));
                }
                Ok(Self::Leaf {
                    attribute,
                    operator,
                    value: Some(value),
                })
            }
        }
    }

    /// Wraps `self` with the implicit root-level `consent_state = OPT_IN`
    /// conjunct, as required for every segment evaluation (§4.4).
    #[must_use]
    pub fn with_implicit_consent_filter(self) -> Self {
        let consent_leaf = Self::Leaf {
            attribute: CONSENT_STATE_ATTRIBUTE.to_string(),
            operator: Operator::Equals,
            value: Some(Value::String("OPT_IN".to_string())),
        };
        Self::Composite {
            logic: Logic::And,
            conditions: vec![consent_leaf, self],
        }
    }
}

// ============================================================================
// SECTION: Segment
// ============================================================================

/// A named segment: identity plus its validated rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment identity.
    pub id: SegmentId,
    /// Human-readable name.
    pub name: String,
    /// Validated rule tree. The implicit consent filter is applied at
    /// evaluation time, not stored here.
    pub rule: RuleNode,
}
