// messaging-core/src/runtime/template_renderer.rs
// ============================================================================
// Module: Template Renderer
// Description: Substitutes a recipient's attribute bag into a template.
// Purpose: Produce the rendered content stored once on a Message at
//          materialization, and re-validate it at pipeline stage 4.
// Dependencies: crate::core, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Rendering is a single pass of `{name}` substitution against the
//! recipient's attribute bag. A placeholder with no matching attribute, or
//! whose attribute value is not a scalar, fails the render rather than
//! emitting an empty or stringified-JSON-object string into outbound
//! content.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::AttributeBag;
use crate::core::Template;
use crate::core::extract_placeholders;

// ============================================================================
// SECTION: Render Errors
// ============================================================================

/// Errors returned by [`TemplateRenderer::render`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// One or more declared variables had no attribute, or an empty one.
    #[error("missing or empty attributes for placeholders: {}", .0.join(", "))]
    MissingAttribute(Vec<String>),
    /// An attribute matching a placeholder was not a scalar value.
    #[error("non-scalar attribute for placeholder: {0}")]
    NonScalarAttribute(String),
}

// ============================================================================
// SECTION: Template Renderer
// ============================================================================

/// Stateless template-rendering capability.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    /// Renders `template.content` against `attrs`.
    ///
    /// Checks every declared variable in `template.variables`, not merely
    /// every placeholder appearing in `content`: a declared variable with
    /// no backing attribute, or an empty-string one, is collected into the
    /// `missing` set rather than failing on the first offender.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::MissingAttribute`] carrying every missing or
    /// empty declared variable, or [`RenderError::NonScalarAttribute`] when
    /// a declared variable resolves to a non-scalar value.
    pub fn render(&self, template: &Template, attrs: &AttributeBag) -> Result<String, RenderError> {
        let missing: Vec<String> = template
            .variables
            .iter()
            .filter(|variable| match attrs.get(variable.as_str()) {
                None => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            })
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(RenderError::MissingAttribute(missing));
        }

        let mut rendered = template.content.clone();
        for placeholder in extract_placeholders(&template.content) {
            let Some(value) = attrs.get(&placeholder) else {
                continue;
            };
            let text = scalar_to_string(value).ok_or_else(|| RenderError::NonScalarAttribute(placeholder.clone()))?;
            rendered = rendered.replace(&format!("{{{placeholder}}}"), &text);
        }
        Ok(rendered)
    }
}

/// Converts a scalar JSON value to its rendered string form. An empty
/// string is treated the same as an absent attribute by [`render`]'s
/// variable-presence check, never substituted here.
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Maximum rendered content length permitted by pipeline stage 4 (§4.7).
pub const MAX_CONTENT_LENGTH: usize = 4096;

/// Re-validates already-rendered content at pipeline stage 4: non-empty,
/// within [`MAX_CONTENT_LENGTH`], and free of any surviving placeholder
/// token (which would indicate a substitution bug, not user input).
#[must_use]
pub fn validate_rendered_content(content: &str) -> bool {
    !content.is_empty() && content.len() <= MAX_CONTENT_LENGTH && extract_placeholders(content).is_empty()
}
