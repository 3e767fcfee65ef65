// messaging-core/src/runtime/orchestrator.rs
// ============================================================================
// Module: Campaign Orchestrator
// Description: Per-campaign driver implementing materialization and the
//              six-stage compliance pipeline.
// Purpose: Resolve recipients, materialize messages, and drive each through
//          consent, quiet hours, rate limiting, content validation, and
//          dispatch, auditing every stage outcome.
// Dependencies: crate::{core, interfaces, runtime::*}
// ============================================================================

//! ## Overview
//! [`CampaignOrchestrator`] is the central component (§4.7). A campaign
//! run is exclusive: [`CampaignOrchestrator::trigger`] tracks in-flight
//! campaigns in an in-process set so a second concurrent trigger observes
//! the already-running campaign rather than starting a duplicate pass.
//! Each pipeline stage appends its own audit record, so "append a record
//! capturing the outcome" (§4.7 stage 6) holds on every exit path,
//! including the early returns on consent, quiet-hours, and rate-limit
//! outcomes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::Mutex;

use chrono_tz::Tz;
use serde_json::json;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::core::AuditKind;
use crate::core::AuditRecord;
use crate::core::AuditSubject;
use crate::core::Campaign;
use crate::core::CampaignId;
use crate::core::CampaignStatus;
use crate::core::MessageId;
use crate::core::MessageStatus;
use crate::core::Timestamp;
use crate::core::next_audit_id;
use crate::interfaces::Clock;
use crate::interfaces::Cursor;
use crate::interfaces::MessageTransitionFields;
use crate::interfaces::PipelineEvent;
use crate::interfaces::ProviderClient;
use crate::interfaces::ProviderErrorKind;
use crate::interfaces::RateLimitOutcome;
use crate::interfaces::RateLimiter;
use crate::interfaces::Scheduler;
use crate::interfaces::Store;
use crate::interfaces::StoreError;
use crate::runtime::consent_service::ConsentError;
use crate::runtime::consent_service::ConsentService;
use crate::runtime::consent_service::Eligibility;
use crate::runtime::scheduler::backoff;
use crate::runtime::segment_evaluator::SegmentEvaluator;
use crate::runtime::template_renderer::RenderError;
use crate::runtime::template_renderer::TemplateRenderer;
use crate::runtime::template_renderer::validate_rendered_content;

/// Transient dispatch retries permitted before a message fails.
const DISPATCH_RETRY_BUDGET: u32 = 3;

/// Page size used when streaming matching recipients at materialization.
const MATERIALIZATION_PAGE_SIZE: usize = 200;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors returned by [`CampaignOrchestrator`] operations.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A consent-service call failed.
    #[error(transparent)]
    Consent(#[from] ConsentError),
    /// The rate limiter's backing substrate failed.
    #[error(transparent)]
    RateLimit(#[from] crate::interfaces::RateLimitError),
    /// The requested campaign does not exist.
    #[error("campaign not found: {0}")]
    CampaignNotFound(CampaignId),
    /// The requested message does not exist.
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),
    /// The campaign's template does not exist.
    #[error("template not found for campaign {0}")]
    TemplateNotFound(CampaignId),
    /// The campaign's segment does not exist.
    #[error("segment not found for campaign {0}")]
    SegmentNotFound(CampaignId),
    /// The requested lifecycle transition is not legal from the current
    /// status.
    #[error("campaign {0} cannot transition to {1:?}")]
    IllegalTransition(CampaignId, CampaignStatus),
}

// ============================================================================
// SECTION: Campaign Orchestrator
// ============================================================================

/// Drives campaigns through materialization and the compliance pipeline.
#[derive(Clone)]
pub struct CampaignOrchestrator {
    /// Backing store.
    store: Arc<dyn Store>,
    /// Consent eligibility and keyword transitions.
    consent: ConsentService,
    /// Shared rate limiter.
    rate_limiter: Arc<dyn RateLimiter>,
    /// Outbound delivery capability.
    provider: Arc<dyn ProviderClient>,
    /// Injected time source.
    clock: Arc<dyn Clock>,
    /// Delayed-task primitive for retries and reschedules.
    scheduler: Arc<dyn Scheduler>,
    /// Template rendering.
    renderer: TemplateRenderer,
    /// Segment-to-recipient resolution.
    evaluator: SegmentEvaluator,
    /// Campaigns with a run currently in flight, guarding against a
    /// duplicate concurrent trigger.
    active_runs: Arc<Mutex<HashSet<CampaignId>>>,
}

impl CampaignOrchestrator {
    /// Creates a new orchestrator wiring together every injected
    /// capability.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        rate_limiter: Arc<dyn RateLimiter>,
        provider: Arc<dyn ProviderClient>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let consent = ConsentService::new(store.clone());
        let evaluator = SegmentEvaluator::new(store.clone());
        Self {
            store,
            consent,
            rate_limiter,
            provider,
            clock,
            scheduler,
            renderer: TemplateRenderer,
            evaluator,
            active_runs: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Appends a pipeline-stage audit record.
    fn audit(&self, kind: AuditKind, subject: AuditSubject, detail: serde_json::Value, at: Timestamp) {
        let record = AuditRecord {
            id: next_audit_id(at, &format!("{subject:?}")),
            kind,
            subject,
            detail,
            at,
        };
        if let Err(err) = self.store.append_audit(record) {
            error!(error = %err, "failed to append audit record");
        }
    }

    // ------------------------------------------------------------------
    // Trigger / lifecycle
    // ------------------------------------------------------------------

    /// Triggers a campaign run. Idempotent under concurrent callers: a
    /// second trigger while a run is already active observes the current
    /// status without starting a duplicate pass.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the campaign does not exist or
    /// its current status cannot legally advance.
    pub fn trigger(&self, campaign_id: &CampaignId) -> Result<CampaignStatus, OrchestratorError> {
        {
            let guard = self.active_runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            if guard.contains(campaign_id) {
                let campaign = self.load_campaign(campaign_id)?;
                return Ok(campaign.status);
            }
        }

        let mut campaign = self.load_campaign(campaign_id)?;
        if campaign.status == CampaignStatus::Draft {
            self.transition_campaign(&mut campaign, CampaignStatus::Ready)?;
        }
        if campaign.status == CampaignStatus::Ready {
            self.transition_campaign(&mut campaign, CampaignStatus::Running)?;
        }
        if campaign.status != CampaignStatus::Running {
            return Ok(campaign.status);
        }

        self.active_runs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(campaign_id.clone());

        let materialize_result = self.materialize(&mut campaign);
        self.active_runs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(campaign_id);
        materialize_result?;

        self.maybe_complete(campaign_id)?;
        let campaign = self.load_campaign(campaign_id)?;
        Ok(campaign.status)
    }

    /// Pauses a running campaign; in-flight dispatches still complete.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the campaign cannot legally pause.
    pub fn pause(&self, campaign_id: &CampaignId) -> Result<(), OrchestratorError> {
        let mut campaign = self.load_campaign(campaign_id)?;
        self.transition_campaign(&mut campaign, CampaignStatus::Paused)
    }

    /// Resumes a paused campaign.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the campaign cannot legally
    /// resume.
    pub fn resume(&self, campaign_id: &CampaignId) -> Result<(), OrchestratorError> {
        let mut campaign = self.load_campaign(campaign_id)?;
        self.transition_campaign(&mut campaign, CampaignStatus::Running)
    }

    /// Loads a campaign, translating `None` into [`OrchestratorError::CampaignNotFound`].
    fn load_campaign(&self, campaign_id: &CampaignId) -> Result<Campaign, OrchestratorError> {
        self.store
            .get_campaign(campaign_id)?
            .ok_or_else(|| OrchestratorError::CampaignNotFound(campaign_id.clone()))
    }

    /// Applies and persists a lifecycle transition, auditing it.
    fn transition_campaign(&self, campaign: &mut Campaign, to: CampaignStatus) -> Result<(), OrchestratorError> {
        let from = campaign.status;
        campaign
            .transition(to)
            .map_err(|rejected| OrchestratorError::IllegalTransition(campaign.id.clone(), rejected))?;
        self.store.upsert_campaign(campaign)?;
        let now = Timestamp::from(self.clock.now());
        self.audit(
            AuditKind::CampaignTransition,
            AuditSubject::Campaign(campaign.id.clone()),
            json!({ "from": format!("{from:?}"), "to": format!("{to:?}") }),
            now,
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // Materialization
    // ------------------------------------------------------------------

    /// Streams the campaign's segment, rendering and creating a `QUEUED`
    /// message per matching recipient, resuming from the persisted cursor.
    fn materialize(&self, campaign: &mut Campaign) -> Result<(), OrchestratorError> {
        let template = self
            .store
            .get_template(&campaign.template_id)?
            .ok_or_else(|| OrchestratorError::TemplateNotFound(campaign.id.clone()))?;
        let segment = self
            .store
            .get_segment(&campaign.segment_id)?
            .ok_or_else(|| OrchestratorError::SegmentNotFound(campaign.id.clone()))?;

        let mut cursor = Cursor(campaign.materialization_cursor.clone());
        loop {
            let page = self.evaluator.resolve_page(&segment, cursor.clone(), MATERIALIZATION_PAGE_SIZE)?;
            for e164 in &page.recipients {
                let recipient = self.store.get_recipient(e164)?;
                let attrs = recipient.map(|r| r.attributes).unwrap_or_default();
                let now = Timestamp::from(self.clock.now());
                match self.renderer.render(&template, &attrs) {
                    Ok(rendered) => {
                        let message_id = self.store.create_message(&campaign.id, e164, &rendered, now)?;
                        self.run_pipeline(&message_id)?;
                    }
                    Err(RenderError::MissingAttribute(fields)) => {
                        let reason = fields.join(", ");
                        warn!(recipient = %e164, field = %reason, "materialization skipped recipient: render failed");
                        self.audit(
                            AuditKind::MaterializationSkipped,
                            AuditSubject::Recipient(e164.clone()),
                            json!({ "campaign": campaign.id.as_str(), "reason": reason }),
                            now,
                        );
                    }
                    Err(RenderError::NonScalarAttribute(field)) => {
                        warn!(recipient = %e164, field = %field, "materialization skipped recipient: render failed");
                        self.audit(
                            AuditKind::MaterializationSkipped,
                            AuditSubject::Recipient(e164.clone()),
                            json!({ "campaign": campaign.id.as_str(), "reason": field }),
                            now,
                        );
                    }
                }
            }
            let exhausted = page.next_cursor.0.is_none();
            cursor = page.next_cursor;
            self.store
                .save_materialization_progress(&campaign.id, cursor.clone(), exhausted)?;
            if exhausted {
                campaign.materialization_cursor = None;
                campaign.materialization_complete = true;
                break;
            }
            campaign.materialization_cursor = cursor.0.clone();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scheduler event handling
    // ------------------------------------------------------------------

    /// Handles one delayed [`PipelineEvent`] fired by the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the underlying Store call fails.
    pub fn handle_event(&self, event: PipelineEvent) -> Result<(), OrchestratorError> {
        match event {
            PipelineEvent::MessageReady(message_id) => self.run_pipeline(&message_id),
            PipelineEvent::CampaignTick(campaign_id) => self.maybe_complete(&campaign_id),
        }
    }

    /// Runs the scheduler-event driver loop until the channel closes.
    /// Each event's handling (Store I/O and, on dispatch, the blocking
    /// `ProviderClient` send) runs on the blocking thread pool via
    /// [`tokio::task::spawn_blocking`] so it never occupies an async
    /// worker thread. Intended to be spawned as a background task by the
    /// hosting binary.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<PipelineEvent>) {
        while let Some(event) = events.recv().await {
            let this = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || this.handle_event(event)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(error = %err, "pipeline event handling failed"),
                Err(join_err) => error!(error = %join_err, "pipeline event handling task panicked"),
            }
        }
    }

    /// Transitions a `RUNNING` campaign to `COMPLETED` once every
    /// materialized message is terminal and materialization has drained.
    fn maybe_complete(&self, campaign_id: &CampaignId) -> Result<(), OrchestratorError> {
        let mut campaign = self.load_campaign(campaign_id)?;
        if campaign.status != CampaignStatus::Running || !campaign.materialization_complete {
            return Ok(());
        }
        let pending = self.store.list_non_terminal_messages(campaign_id)?;
        if pending.is_empty() {
            self.transition_campaign(&mut campaign, CampaignStatus::Completed)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Six-stage compliance pipeline
    // ------------------------------------------------------------------

    /// Drives one `QUEUED` message through the compliance pipeline. A
    /// no-op if the message has already progressed past `QUEUED` (e.g. a
    /// duplicate scheduler invocation).
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError`] when the underlying Store call fails.
    pub fn run_pipeline(&self, message_id: &MessageId) -> Result<(), OrchestratorError> {
        let message = self
            .store
            .get_message(message_id)?
            .ok_or_else(|| OrchestratorError::MessageNotFound(message_id.clone()))?;
        if message.status != MessageStatus::Queued {
            return Ok(());
        }
        let campaign = self.load_campaign(&message.campaign_id)?;
        let now_dt = self.clock.now();
        let now = Timestamp::from(now_dt);

        // Stage 1: consent.
        match self.consent.is_eligible(&message.recipient) {
            Ok(Eligibility::Ok) => {}
            Ok(Eligibility::Blocked(state)) => {
                self.fail_message(&message.id, MessageStatus::Queued, "consent_blocked", now);
                self.audit(
                    AuditKind::PipelineConsent,
                    AuditSubject::Message(message.id.clone()),
                    json!({ "blocked_by": state.to_string() }),
                    now,
                );
                return Ok(());
            }
            Err(ConsentError::RecipientNotFound(_)) => {
                self.fail_message(&message.id, MessageStatus::Queued, "recipient_not_found", now);
                self.audit(
                    AuditKind::PipelineConsent,
                    AuditSubject::Message(message.id.clone()),
                    json!({ "blocked_by": "recipient_not_found" }),
                    now,
                );
                return Ok(());
            }
            Err(ConsentError::Store(err)) => return Err(err.into()),
        }

        // Stage 2: quiet hours.
        let recipient = self.store.get_recipient(&message.recipient)?;
        let tz = recipient
            .as_ref()
            .and_then(|r| r.attributes.get("timezone"))
            .and_then(|v| v.as_str())
            .and_then(|s| Tz::from_str(s).ok())
            .unwrap_or(campaign.default_quiet_hours.timezone);
        let local_time = now_dt.with_timezone(&tz).time();
        if campaign.default_quiet_hours.contains(local_time) {
            let next_allowed = next_quiet_hours_exit(now_dt, &campaign, tz);
            self.reschedule(&message.id, next_allowed, now, AuditKind::PipelineQuietHours, "quiet_hours");
            return Ok(());
        }

        // Stage 3: rate limit.
        match self.rate_limiter.try_acquire(&campaign.id, campaign.rate_limit_per_second, now_dt)? {
            RateLimitOutcome::Admitted => {}
            RateLimitOutcome::Rejected { retry_after } => {
                self.reschedule(&message.id, retry_after, now, AuditKind::PipelineRateLimit, "rate_limited");
                return Ok(());
            }
        }

        // Stage 4: content validation.
        if !validate_rendered_content(&message.rendered_content) {
            self.fail_message(&message.id, MessageStatus::Queued, "content_invalid", now);
            self.audit(
                AuditKind::PipelineContent,
                AuditSubject::Message(message.id.clone()),
                json!({ "reason": "content_invalid" }),
                now,
            );
            return Ok(());
        }

        // Stage 5: dispatch.
        self.dispatch(&message.id, &message.recipient, &message.rendered_content, message.retry_count, now)?;

        Ok(())
    }

    /// Reschedules a message without changing its status (quiet hours or
    /// rate limit stage outcomes never consume the retry budget).
    fn reschedule(&self, message_id: &MessageId, at: chrono::DateTime<chrono::Utc>, now: Timestamp, kind: AuditKind, reason: &str) {
        if let Err(err) = self.scheduler.delay(message_id.as_str(), at, PipelineEvent::MessageReady(message_id.clone())) {
            error!(error = %err, message = %message_id, "failed to schedule retry");
        }
        self.audit(kind, AuditSubject::Message(message_id.clone()), json!({ "reason": reason, "retry_at": at.to_rfc3339() }), now);
    }

    /// Transitions a message to `FAILED` from `from`, tolerating a lost
    /// compare-and-set race (another caller already moved it).
    fn fail_message(&self, message_id: &MessageId, from: MessageStatus, error_code: &str, now: Timestamp) {
        let fields = MessageTransitionFields {
            provider_sid: None,
            error_code: Some(error_code.to_string()),
            increment_retry: false,
            at: now,
        };
        if let Err(err) = self.store.transition_message(message_id, from, MessageStatus::Failed, fields) {
            warn!(error = %err, message = %message_id, "failed to transition message to FAILED");
        }
    }

    /// Executes pipeline stage 5: dispatch through the `ProviderClient`,
    /// applying the retry budget and backoff on transient failure.
    fn dispatch(
        &self,
        message_id: &MessageId,
        to: &crate::core::E164,
        body: &str,
        retry_count: u32,
        now: Timestamp,
    ) -> Result<(), OrchestratorError> {
        self.store.transition_message(
            message_id,
            MessageStatus::Queued,
            MessageStatus::Sending,
            MessageTransitionFields {
                provider_sid: None,
                error_code: None,
                increment_retry: false,
                at: now,
            },
        )?;

        match self.provider.send(to, body) {
            Ok(outcome) => {
                self.store.transition_message(
                    message_id,
                    MessageStatus::Sending,
                    MessageStatus::Sent,
                    MessageTransitionFields {
                        provider_sid: Some(outcome.provider_sid.clone()),
                        error_code: None,
                        increment_retry: false,
                        at: now,
                    },
                )?;
                info!(message = %message_id, provider_sid = %outcome.provider_sid, "message dispatched");
                self.audit(
                    AuditKind::PipelineDispatch,
                    AuditSubject::Message(message_id.clone()),
                    json!({ "outcome": "sent", "provider_sid": outcome.provider_sid }),
                    now,
                );
            }
            Err(err) if err.kind == ProviderErrorKind::Permanent => {
                self.store.transition_message(
                    message_id,
                    MessageStatus::Sending,
                    MessageStatus::Failed,
                    MessageTransitionFields {
                        provider_sid: None,
                        error_code: Some(err.code.to_string()),
                        increment_retry: false,
                        at: now,
                    },
                )?;
                self.audit(
                    AuditKind::PipelineDispatch,
                    AuditSubject::Message(message_id.clone()),
                    json!({ "outcome": "failed_permanent", "code": err.code }),
                    now,
                );
            }
            Err(err) => {
                let attempted_retry = retry_count + 1;
                if attempted_retry > DISPATCH_RETRY_BUDGET {
                    self.store.transition_message(
                        message_id,
                        MessageStatus::Sending,
                        MessageStatus::Failed,
                        MessageTransitionFields {
                            provider_sid: None,
                            error_code: Some(err.code.to_string()),
                            increment_retry: true,
                            at: now,
                        },
                    )?;
                    self.audit(
                        AuditKind::PipelineDispatch,
                        AuditSubject::Message(message_id.clone()),
                        json!({ "outcome": "retry_budget_exhausted", "code": err.code }),
                        now,
                    );
                } else {
                    self.store.transition_message(
                        message_id,
                        MessageStatus::Sending,
                        MessageStatus::Queued,
                        MessageTransitionFields {
                            provider_sid: None,
                            error_code: Some(err.code.to_string()),
                            increment_retry: true,
                            at: now,
                        },
                    )?;
                    let delay = backoff(attempted_retry);
                    let retry_at = now.as_datetime() + delay;
                    if let Err(sched_err) = self.scheduler.delay(message_id.as_str(), retry_at, PipelineEvent::MessageReady(message_id.clone())) {
                        error!(error = %sched_err, message = %message_id, "failed to schedule dispatch retry");
                    }
                    self.audit(
                        AuditKind::PipelineDispatch,
                        AuditSubject::Message(message_id.clone()),
                        json!({ "outcome": "retry_scheduled", "code": err.code, "retry_count": attempted_retry }),
                        now,
                    );
                }
            }
        }
        Ok(())
    }
}

/// Computes the next UTC instant at which the recipient-local quiet-hours
/// window ends, given `now` falls inside it.
fn next_quiet_hours_exit(now: chrono::DateTime<chrono::Utc>, campaign: &Campaign, tz: Tz) -> chrono::DateTime<chrono::Utc> {
    let local_now = now.with_timezone(&tz);
    let end = campaign.default_quiet_hours.end;
    let mut candidate = local_now.date_naive().and_time(end);
    if candidate <= local_now.naive_local() {
        candidate += chrono::Duration::days(1);
    }
    candidate
        .and_local_timezone(tz)
        .single()
        .unwrap_or(local_now)
        .with_timezone(&chrono::Utc)
}
