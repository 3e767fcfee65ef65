// messaging-server/tests/http.rs
// ============================================================================
// Module: HTTP Surface Tests
// Description: Exercises the four handlers over an in-memory AppState built
//              from messaging-core's test doubles.
// Purpose: Verify webhook ingestion, campaign trigger, and liveness behave
//          per §6 without a running SQLite store or network provider.
// Dependencies: messaging-server, messaging-core, axum, tower, http-body-util
// ============================================================================

//! ## Overview
//! Builds the router directly over [`messaging_core::InMemoryStore`] and
//! friends, driving requests through `tower::ServiceExt::oneshot` rather than
//! a bound socket.

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

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use chrono::NaiveTime;
use chrono::TimeZone;
use chrono::Utc;
use chrono_tz::Tz;
use http_body_util::BodyExt;
use messaging_core::AttributeBag;
use messaging_core::Campaign;
use messaging_core::CampaignId;
use messaging_core::CampaignOrchestrator;
use messaging_core::CampaignStatus;
use messaging_core::Clock;
use messaging_core::ConsentService;
use messaging_core::E164;
use messaging_core::FakeClock;
use messaging_core::InMemoryRateLimiter;
use messaging_core::InMemoryStore;
use messaging_core::QuietHours;
use messaging_core::RuleNode;
use messaging_core::Segment;
use messaging_core::SegmentId;
use messaging_core::Store;
use messaging_core::Template;
use messaging_core::TemplateId;
use messaging_core::TestProviderClient;
use messaging_core::Timestamp;
use messaging_core::TokioScheduler;
use messaging_core::TopicId;
use messaging_core::WebhookIngestor;
use messaging_server::AppState;
use tower::ServiceExt;

fn open_hours() -> QuietHours {
    QuietHours {
        start: NaiveTime::from_hms_opt(21, 0, 0).expect("valid"),
        end: NaiveTime::from_hms_opt(8, 0, 0).expect("valid"),
        timezone: "UTC".parse::<Tz>().expect("valid"),
    }
}

fn seeded_state() -> (AppState, CampaignId) {
    let store = Arc::new(InMemoryStore::new());
    let clock: Arc<dyn Clock> =
        Arc::new(FakeClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().expect("valid")));
    let rate_limiter = Arc::new(InMemoryRateLimiter::new());
    let provider = Arc::new(TestProviderClient::new());
    let (scheduler, events) = TokioScheduler::new();

    let template = Template {
        id: TemplateId::new("tmpl-1"),
        content: "Hi {name}".to_string(),
        variables: ["name".to_string()].into_iter().collect(),
        channel: "sms".to_string(),
        locale: "en-US".to_string(),
    };
    store.seed_template(template);

    let segment = Segment {
        id: SegmentId::new("seg-1"),
        name: "everyone".to_string(),
        rule: RuleNode::Leaf { attribute: "plan".to_string(), operator: messaging_core::Operator::Exists, value: None },
    };
    store.seed_segment(segment);

    let campaign_id = CampaignId::new("camp-1");
    let campaign = Campaign {
        id: campaign_id.clone(),
        topic: TopicId::new("topic-1"),
        template_id: TemplateId::new("tmpl-1"),
        segment_id: SegmentId::new("seg-1"),
        schedule_time: None,
        status: CampaignStatus::Ready,
        rate_limit_per_second: 10,
        default_quiet_hours: open_hours(),
        materialization_cursor: None,
        materialization_complete: true,
    };
    store.upsert_campaign(&campaign).expect("seed campaign");

    let e164 = E164::parse("+15551230000").expect("valid e164");
    let now = Timestamp::from(clock.now());
    let mut attrs = AttributeBag::new();
    attrs.insert("name".to_string(), serde_json::json!("Ada"));
    attrs.insert("plan".to_string(), serde_json::json!("pro"));
    store.upsert_recipient(&e164, attrs, now).expect("seed recipient");

    let orchestrator = Arc::new(CampaignOrchestrator::new(
        store.clone() as Arc<dyn Store>,
        rate_limiter,
        provider,
        clock.clone(),
        Arc::new(scheduler),
    ));
    std::mem::drop(events);

    let ingestor = WebhookIngestor::new(store.clone() as Arc<dyn Store>, ConsentService::new(store.clone() as Arc<dyn Store>));
    let state = AppState { store: store as Arc<dyn Store>, ingestor, orchestrator, clock };
    (state, campaign_id)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.expect("collect body").to_bytes();
    serde_json::from_slice(&bytes).expect("valid json body")
}

#[tokio::test]
async fn healthz_reports_ok_when_store_is_reachable() {
    let (state, _campaign_id) = seeded_state();
    let app = messaging_server::router(state);

    let response = app
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn webhooks_inbound_accepts_valid_form_payload() {
    let (state, _campaign_id) = seeded_state();
    let app = messaging_server::router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/inbound")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("From=%2B15551230000&Body=STOP&MessageSid=SM123"))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn webhooks_inbound_accepts_malformed_body_without_failing() {
    let (state, _campaign_id) = seeded_state();
    let app = messaging_server::router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/inbound")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("not-a-form-body"))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn webhooks_status_accepts_valid_form_payload() {
    let (state, _campaign_id) = seeded_state();
    let app = messaging_server::router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/webhooks/status")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("MessageSid=SM123&MessageStatus=delivered"))
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn campaigns_trigger_returns_not_found_for_unknown_campaign() {
    let (state, _campaign_id) = seeded_state();
    let app = messaging_server::router(state);

    let request =
        Request::builder().method("POST").uri("/campaigns/does-not-exist/trigger").body(Body::empty()).expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn campaigns_trigger_runs_ready_campaign_and_returns_status() {
    let (state, campaign_id) = seeded_state();
    let app = messaging_server::router(state);

    let request = Request::builder()
        .method("POST")
        .uri(format!("/campaigns/{campaign_id}/trigger"))
        .body(Body::empty())
        .expect("request");

    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["status"].is_string());
    assert!(body["taskId"].is_string());
}

#[tokio::test]
async fn campaigns_trigger_is_idempotent_under_repeated_calls() {
    let (state, campaign_id) = seeded_state();
    let app = messaging_server::router(state);

    for _ in 0..2 {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/campaigns/{campaign_id}/trigger"))
            .body(Body::empty())
            .expect("request");
        let response = app.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
