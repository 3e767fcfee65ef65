// messaging-core/src/runtime/segment_evaluator.rs
// ============================================================================
// Module: Segment Evaluator
// Description: In-memory rule-tree evaluation and Store-backed recipient
//              resolution.
// Purpose: Decide whether one recipient matches a segment, and stream the
//          full matching set page by page for campaign materialization.
// Dependencies: crate::{core, interfaces, runtime::comparator}
// ============================================================================

//! ## Overview
//! Evaluation of a closed [`RuleNode`] tree against one recipient's
//! attribute bag is pure and total (see [`crate::runtime::comparator`]).
//! Resolving the *set* of matching recipients is delegated to the
//! [`Store`], which may push the conjunctive prefix of simple leaves down
//! into its own query engine; [`SegmentEvaluator`] only guarantees the
//! final filter is applied and that the implicit `consent_state = OPT_IN`
//! conjunct is always present.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::AttributeBag;
use crate::core::Logic;
use crate::core::RuleNode;
use crate::core::Segment;
use crate::interfaces::Cursor;
use crate::interfaces::RecipientPage;
use crate::interfaces::Store;
use crate::interfaces::StoreError;
use crate::runtime::comparator::evaluate_leaf;

// ============================================================================
// SECTION: Pure Evaluation
// ============================================================================

/// Evaluates `rule` against `attrs`, recursing through composites.
#[must_use]
pub fn evaluate(rule: &RuleNode, attrs: &AttributeBag) -> bool {
    match rule {
        RuleNode::Leaf {
            attribute,
            operator,
            value,
        } => evaluate_leaf(attribute, *operator, value.as_ref(), attrs),
        RuleNode::Composite { logic, conditions } => match logic {
            Logic::And => conditions.iter().all(|c| evaluate(c, attrs)),
            Logic::Or => conditions.iter().any(|c| evaluate(c, attrs)),
        },
    }
}

// ============================================================================
// SECTION: Segment Evaluator
// ============================================================================

/// Resolves segments to recipient pages through a [`Store`], applying the
/// implicit consent filter every campaign materialization requires.
#[derive(Clone)]
pub struct SegmentEvaluator {
    /// Backing store, queried for the candidate recipient stream.
    store: Arc<dyn Store>,
}

impl SegmentEvaluator {
    /// Creates a new evaluator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns one page of recipients matching `segment`, resumable via
    /// `cursor`. The implicit `consent_state = OPT_IN` conjunct is applied
    /// unconditionally, regardless of what `segment.rule` already contains.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the underlying store query fails.
    pub fn resolve_page(
        &self,
        segment: &Segment,
        cursor: Cursor,
        limit: usize,
    ) -> Result<RecipientPage, StoreError> {
        let rule = segment.rule.clone().with_implicit_consent_filter();
        self.store.list_recipients_matching(&rule, cursor, limit)
    }
}
