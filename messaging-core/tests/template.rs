// messaging-core/tests/template.rs
// ============================================================================
// Module: Template Tests
// Description: Tests for placeholder extraction, validation, and rendering.
// Purpose: Ensure templates reject undeclared placeholders and render
//          deterministically.
// Dependencies: messaging-core
// ============================================================================

//! ## Overview
//! Covers placeholder extraction edge cases and the renderer's strict
//! scalar-only substitution rule.

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

use std::collections::BTreeSet;

use messaging_core::RenderError;
use messaging_core::Template;
use messaging_core::TemplateError;
use messaging_core::TemplateId;
use messaging_core::TemplateRenderer;
use messaging_core::extract_placeholders;

fn template(content: &str, variables: &[&str]) -> Template {
    Template {
        id: TemplateId::new("tmpl-1"),
        content: content.to_string(),
        variables: variables.iter().map(|s| (*s).to_string()).collect(),
        channel: "sms".to_string(),
        locale: "en-US".to_string(),
    }
}

#[test]
fn extract_placeholders_finds_alphanumeric_underscore_names() {
    let found = extract_placeholders("Hi {first_name}, your code is {code1}.");
    assert_eq!(found, BTreeSet::from(["first_name".to_string(), "code1".to_string()]));
}

#[test]
fn extract_placeholders_ignores_unterminated_braces() {
    let found = extract_placeholders("Hi {first_name, unterminated");
    assert!(found.is_empty());
}

#[test]
fn validate_rejects_undeclared_placeholder() {
    let t = template("Hi {name}", &[]);
    assert_eq!(t.validate(), Err(TemplateError::UndeclaredPlaceholder("name".to_string())));
}

#[test]
fn validate_accepts_fully_declared_template() {
    let t = template("Hi {name}, code {code}", &["name", "code"]);
    assert!(t.validate().is_ok());
}

#[test]
fn render_substitutes_scalar_attributes() {
    let t = template("Hi {name}, balance {amount}", &["name", "amount"]);
    let mut attrs = messaging_core::AttributeBag::new();
    attrs.insert("name".to_string(), serde_json::json!("Ada"));
    attrs.insert("amount".to_string(), serde_json::json!(42));

    let rendered = TemplateRenderer.render(&t, &attrs).expect("render");
    assert_eq!(rendered, "Hi Ada, balance 42");
}

#[test]
fn render_fails_on_missing_attribute() {
    let t = template("Hi {name}", &["name"]);
    let attrs = messaging_core::AttributeBag::new();
    assert_eq!(TemplateRenderer.render(&t, &attrs), Err(RenderError::MissingAttribute(vec!["name".to_string()])));
}

#[test]
fn render_fails_on_empty_attribute() {
    let t = template("Hi {name}", &["name"]);
    let mut attrs = messaging_core::AttributeBag::new();
    attrs.insert("name".to_string(), serde_json::json!(""));
    assert_eq!(TemplateRenderer.render(&t, &attrs), Err(RenderError::MissingAttribute(vec!["name".to_string()])));
}

#[test]
fn render_collects_every_missing_declared_variable() {
    let t = template("Hi {name}", &["name", "promo_code"]);
    let mut attrs = messaging_core::AttributeBag::new();
    attrs.insert("name".to_string(), serde_json::json!(""));
    assert_eq!(
        TemplateRenderer.render(&t, &attrs),
        Err(RenderError::MissingAttribute(vec!["name".to_string(), "promo_code".to_string()]))
    );
}

#[test]
fn render_fails_on_declared_variable_unused_in_content() {
    let t = template("Hi {name}", &["name", "promo_code"]);
    let mut attrs = messaging_core::AttributeBag::new();
    attrs.insert("name".to_string(), serde_json::json!("Ada"));
    assert_eq!(
        TemplateRenderer.render(&t, &attrs),
        Err(RenderError::MissingAttribute(vec!["promo_code".to_string()]))
    );
}

#[test]
fn render_fails_on_non_scalar_attribute() {
    let t = template("Hi {name}", &["name"]);
    let mut attrs = messaging_core::AttributeBag::new();
    attrs.insert("name".to_string(), serde_json::json!(["Ada", "Lovelace"]));
    assert_eq!(TemplateRenderer.render(&t, &attrs), Err(RenderError::NonScalarAttribute("name".to_string())));
}
