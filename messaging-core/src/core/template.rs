// messaging-core/src/core/template.rs
// ============================================================================
// Module: Template
// Description: Message template identity, content, and declared variables.
// Purpose: Provide the canonical Template entity and its shape invariant.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A template pairs a content string containing `{name}`-style placeholders
//! with a declared variable list. [`Template::validate`] enforces that every
//! placeholder appearing in the content is declared; rendering itself lives
//! in [`crate::runtime::TemplateRenderer`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::TemplateId;

// ============================================================================
// SECTION: Placeholder Extraction
// ============================================================================

/// Extracts the set of `{name}` placeholder tokens appearing in `content`.
/// A placeholder name is alphanumeric-plus-underscore between single braces.
#[must_use]
pub fn extract_placeholders(content: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let mut chars = content.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        if ch != '{' {
            continue;
        }
        let mut end = start + 1;
        let mut valid = true;
        for (idx, c) in content[start + 1..].char_indices() {
            if c == '}' {
                end = start + 1 + idx;
                break;
            }
            if !(c.is_ascii_alphanumeric() || c == '_') {
                valid = false;
                break;
            }
        }
        if valid && end > start + 1 {
            let name = &content[start + 1..end];
            if !name.is_empty() {
                names.insert(name.to_string());
            }
        }
    }
    names
}

// ============================================================================
// SECTION: Template Errors
// ============================================================================

/// Errors returned when validating a template's declared shape.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// A placeholder in the content is not in the declared variable list.
    #[error("undeclared placeholder in template content: {0}")]
    UndeclaredPlaceholder(String),
}

// ============================================================================
// SECTION: Template
// ============================================================================

/// A message template: identity, content, declared variables, channel, and
/// locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Template identity.
    pub id: TemplateId,
    /// Content string containing `{name}` placeholders.
    pub content: String,
    /// Declared variable names; must be a superset of the placeholders
    /// appearing in `content`.
    pub variables: BTreeSet<String>,
    /// Delivery channel (e.g. "sms", "whatsapp").
    pub channel: String,
    /// Locale tag (e.g. "en-US").
    pub locale: String,
}

impl Template {
    /// Validates that every placeholder in `content` is declared.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::UndeclaredPlaceholder`] for the first
    /// placeholder found that is not in `variables`.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for placeholder in extract_placeholders(&self.content) {
            if !self.variables.contains(&placeholder) {
                return Err(TemplateError::UndeclaredPlaceholder(placeholder));
            }
        }
        Ok(())
    }
}
