// messaging-core/tests/property_rate_limiter_and_renderer.rs
// ============================================================================
// Module: Rate Limiter & Template Renderer Property Tests
// Description: Proptest-based invariant checks for the sliding-window rate
//              limiter and the placeholder-substitution template renderer.
// Purpose: Exercise the admission-count and rendering invariants across a
//          wide input space rather than a handful of hand-picked cases.
// Dependencies: messaging-core, proptest, chrono
// ============================================================================

//! ## Overview
//! The rate limiter invariant is counting: exactly `limit` calls land within
//! any one-second window, regardless of how many are attempted. The renderer
//! invariants are determinism (same inputs, same output) and the
//! missing-attribute failure mode (a declared placeholder with no backing
//! attribute always errors, never silently renders blank).

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

use chrono::TimeZone;
use chrono::Utc;
use messaging_core::AttributeBag;
use messaging_core::CampaignId;
use messaging_core::InMemoryRateLimiter;
use messaging_core::RateLimitOutcome;
use messaging_core::RateLimiter;
use messaging_core::RenderError;
use messaging_core::Template;
use messaging_core::TemplateId;
use messaging_core::TemplateRenderer;
use proptest::prelude::*;

fn epoch_plus_millis(millis: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().expect("epoch"))
}

proptest! {
    /// Firing `attempts` calls at the exact same instant admits exactly
    /// `min(attempts, limit)` of them, never more.
    #[test]
    fn rate_limiter_admits_at_most_the_configured_limit(
        limit in 1u32..50,
        attempts in 1usize..200,
    ) {
        let limiter = InMemoryRateLimiter::new();
        let campaign_id = CampaignId::new("camp-prop");
        let now = epoch_plus_millis(0);

        let admitted = (0..attempts)
            .filter(|_| matches!(limiter.try_acquire(&campaign_id, limit, now), Ok(RateLimitOutcome::Admitted)))
            .count();

        let expected = attempts.min(limit as usize);
        prop_assert_eq!(admitted, expected);
    }

    /// Calls spaced at least one second apart are always admitted,
    /// regardless of the configured limit, since each lands in a fresh
    /// window.
    #[test]
    fn rate_limiter_admits_calls_spaced_a_second_apart(
        limit in 1u32..10,
        calls in 1usize..20,
    ) {
        let limiter = InMemoryRateLimiter::new();
        let campaign_id = CampaignId::new("camp-prop-spaced");

        for i in 0..calls {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_possible_wrap,
                reason = "loop bound is capped well below i64/i32 range"
            )]
            let now = epoch_plus_millis(i as i64 * 1_000);
            let outcome = limiter.try_acquire(&campaign_id, limit, now);
            prop_assert!(matches!(outcome, Ok(RateLimitOutcome::Admitted)));
        }
    }

    /// Rendering the same template against the same attributes twice
    /// produces identical output.
    #[test]
    fn renderer_is_deterministic(name in "[a-z]{1,12}") {
        let template = Template {
            id: TemplateId::new("tmpl-prop"),
            content: "Hi {name}, welcome".to_string(),
            variables: ["name".to_string()].into_iter().collect(),
            channel: "sms".to_string(),
            locale: "en-US".to_string(),
        };
        let mut attrs = AttributeBag::new();
        attrs.insert("name".to_string(), serde_json::json!(name));

        let renderer = TemplateRenderer;
        let first = renderer.render(&template, &attrs);
        let second = renderer.render(&template, &attrs);
        prop_assert_eq!(first, second);
    }

    /// A declared placeholder with no backing attribute always fails the
    /// render, never falls back to blank or literal substitution.
    #[test]
    fn renderer_fails_closed_on_missing_attribute(unrelated_key in "[a-z]{1,8}") {
        let template = Template {
            id: TemplateId::new("tmpl-prop-missing"),
            content: "Hi {name}".to_string(),
            variables: ["name".to_string()].into_iter().collect(),
            channel: "sms".to_string(),
            locale: "en-US".to_string(),
        };
        let mut attrs = AttributeBag::new();
        if unrelated_key != "name" {
            attrs.insert(unrelated_key, serde_json::json!("irrelevant"));
        }

        let renderer = TemplateRenderer;
        let result = renderer.render(&template, &attrs);
        prop_assert_eq!(result, Err(RenderError::MissingAttribute(vec!["name".to_string()])));
    }

    /// An empty-string attribute value fails the render the same way an
    /// absent attribute does, never substituting a blank into content,
    /// regardless of how many other unrelated attributes are present.
    #[test]
    fn renderer_fails_closed_on_empty_attribute(noise_values in proptest::collection::vec("[a-z]{1,6}", 0..4)) {
        let template = Template {
            id: TemplateId::new("tmpl-prop-empty"),
            content: "Hi {name}".to_string(),
            variables: ["name".to_string()].into_iter().collect(),
            channel: "sms".to_string(),
            locale: "en-US".to_string(),
        };
        let mut attrs = AttributeBag::new();
        for (index, value) in noise_values.iter().enumerate() {
            attrs.insert(format!("unrelated_{index}"), serde_json::json!(value));
        }
        attrs.insert("name".to_string(), serde_json::json!(""));

        let renderer = TemplateRenderer;
        let result = renderer.render(&template, &attrs);
        prop_assert_eq!(result, Err(RenderError::MissingAttribute(vec!["name".to_string()])));
    }

    /// A non-scalar attribute value (array or object) for a declared
    /// placeholder always fails the render rather than stringifying JSON
    /// into outbound content.
    #[test]
    fn renderer_fails_closed_on_non_scalar_attribute(values in proptest::collection::vec(any::<i32>(), 0..4)) {
        let template = Template {
            id: TemplateId::new("tmpl-prop-nonscalar"),
            content: "Hi {name}".to_string(),
            variables: ["name".to_string()].into_iter().collect(),
            channel: "sms".to_string(),
            locale: "en-US".to_string(),
        };
        let mut attrs = AttributeBag::new();
        attrs.insert("name".to_string(), serde_json::json!(values));

        let renderer = TemplateRenderer;
        let result = renderer.render(&template, &attrs);
        prop_assert_eq!(result, Err(RenderError::NonScalarAttribute("name".to_string())));
    }
}
