// messaging-core/src/interfaces/mod.rs
// ============================================================================
// Module: Messaging Interfaces
// Description: Backend-agnostic interfaces for storage, rate limiting,
//              outbound delivery, and time.
// Purpose: Define the contract surfaces used by the orchestrator and ingestor.
// Dependencies: crate::core, chrono, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the messaging core integrates with external systems
//! without embedding backend-specific details: a durable Store, a shared
//! RateLimiter, an outbound ProviderClient, and an injected Clock/Scheduler
//! pair. All are passed explicitly (never reached via ambient statics) so
//! tests can substitute deterministic doubles.

// ============================================================================
// SECTION: Imports
// ============================================================================

use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use crate::core::AttributeBag;
use crate::core::Campaign;
use crate::core::CampaignId;
use crate::core::ConsentState;
use crate::core::DeliveryReceipt;
use crate::core::E164;
use crate::core::Message;
use crate::core::MessageId;
use crate::core::MessageStatus;
use crate::core::RuleNode;
use crate::core::Segment;
use crate::core::SegmentId;
use crate::core::Template;
use crate::core::TemplateId;
use crate::core::Timestamp;
use crate::core::events::AuditRecord;
use crate::core::events::AuditSubject;
use crate::core::events::InboundEvent;

// ============================================================================
// SECTION: Store
// ============================================================================

/// Errors returned by a [`Store`] implementation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Underlying storage I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// A `transition_message` call's `from` status did not match the
    /// current status; the caller lost the compare-and-set race.
    #[error("message {0} transition conflict")]
    TransitionConflict(MessageId),
    /// A referenced entity (template, segment, recipient, message) does not
    /// exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A uniqueness constraint was violated (e.g. duplicate provider sid).
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Fields carried by a `transition_message` call, beyond the `from`/`to`
/// status pair.
#[derive(Debug, Clone, Default)]
pub struct MessageTransitionFields {
    /// Provider-assigned identifier to record, if any.
    pub provider_sid: Option<String>,
    /// Error code to record, if any.
    pub error_code: Option<String>,
    /// Whether to increment the retry counter.
    pub increment_retry: bool,
    /// Timestamp the transition occurred at.
    pub at: Timestamp,
}

/// An opaque, resumable cursor into a paged recipient stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cursor(pub Option<String>);

/// A page of matching recipients plus the cursor to resume from.
#[derive(Debug, Clone)]
pub struct RecipientPage {
    /// Matching recipient identities, in ascending E.164 order.
    pub recipients: Vec<E164>,
    /// Cursor to pass to the next call; `None` when exhausted.
    pub next_cursor: Cursor,
}

/// Durable persistence with transactional semantics, exposing typed
/// repositories for every entity in §3. This is the *only* mutator of row
/// lifecycles; the Orchestrator and Ingestor are both clients of it.
pub trait Store: Send + Sync {
    /// Looks up a recipient by E.164 identity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn get_recipient(&self, e164: &E164) -> Result<Option<crate::core::Recipient>, StoreError>;

    /// Idempotently upserts a recipient, merging `attrs` last-write-wins.
    /// Defaults consent to `OPT_IN` when the recipient does not yet exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn upsert_recipient(
        &self,
        e164: &E164,
        attrs: AttributeBag,
        at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Applies a consent transition, enforcing STOP-stickiness, and returns
    /// the prior state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the recipient does not exist or on
    /// underlying I/O failure.
    fn update_consent(
        &self,
        e164: &E164,
        new_state: ConsentState,
        source: &str,
        at: Timestamp,
    ) -> Result<ConsentState, StoreError>;

    /// Persists a raw inbound payload unconditionally, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn insert_raw_inbound(&self, event: InboundEvent) -> Result<String, StoreError>;

    /// Persists a raw status-callback payload unconditionally, returning its
    /// id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn insert_raw_receipt(&self, receipt: DeliveryReceipt) -> Result<String, StoreError>;

    /// Creates a message in `QUEUED`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn create_message(
        &self,
        campaign_id: &CampaignId,
        e164: &E164,
        rendered: &str,
        at: Timestamp,
    ) -> Result<MessageId, StoreError>;

    /// Compare-and-set status transition; the only Message mutator.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TransitionConflict`] if the current status is
    /// not `from`, or [`StoreError`] on underlying I/O failure.
    fn transition_message(
        &self,
        id: &MessageId,
        from: MessageStatus,
        to: MessageStatus,
        fields: MessageTransitionFields,
    ) -> Result<(), StoreError>;

    /// Looks up a message by its id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn get_message(&self, id: &MessageId) -> Result<Option<Message>, StoreError>;

    /// Locates a message by its provider-assigned identifier, for
    /// status-callback correlation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn find_message_by_provider_sid(&self, sid: &str) -> Result<Option<Message>, StoreError>;

    /// Returns every message id for a campaign that is not yet terminal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn list_non_terminal_messages(&self, campaign_id: &CampaignId) -> Result<Vec<MessageId>, StoreError>;

    /// Streams a page of recipients matching `rule`, in ascending E.164
    /// order, resumable via `cursor`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn list_recipients_matching(
        &self,
        rule: &RuleNode,
        cursor: Cursor,
        limit: usize,
    ) -> Result<RecipientPage, StoreError>;

    /// Appends an audit record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn append_audit(&self, record: AuditRecord) -> Result<(), StoreError>;

    /// Lists audit records for a subject, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn list_audit(&self, subject: &AuditSubject) -> Result<Vec<AuditRecord>, StoreError>;

    /// Looks up a campaign by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn get_campaign(&self, id: &CampaignId) -> Result<Option<Campaign>, StoreError>;

    /// Inserts or replaces a campaign row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn upsert_campaign(&self, campaign: &Campaign) -> Result<(), StoreError>;

    /// Persists the campaign's materialization cursor and completion flag.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn save_materialization_progress(
        &self,
        id: &CampaignId,
        cursor: Cursor,
        complete: bool,
    ) -> Result<(), StoreError>;

    /// Looks up a template by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn get_template(&self, id: &TemplateId) -> Result<Option<Template>, StoreError>;

    /// Looks up a segment by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on underlying I/O failure.
    fn get_segment(&self, id: &SegmentId) -> Result<Option<Segment>, StoreError>;
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Errors returned by a [`RateLimiter`] implementation.
#[derive(Debug, Error)]
pub enum RateLimitError {
    /// The backing substrate failed (relevant to remote backends).
    #[error("rate limiter backend error: {0}")]
    Backend(String),
}

/// Result of a [`RateLimiter::try_acquire`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitOutcome {
    /// The call was admitted.
    Admitted,
    /// The call was rejected; retry no sooner than the wrapped instant.
    Rejected {
        /// Earliest instant a retry may succeed.
        retry_after: DateTime<Utc>,
    },
}

/// Sliding-window per-campaign counter over a shared in-memory or remote
/// key-value substrate (§4.2).
pub trait RateLimiter: Send + Sync {
    /// Attempts to admit one call against `campaign_id`'s limit.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError`] when the backing substrate fails.
    fn try_acquire(
        &self,
        campaign_id: &CampaignId,
        limit_per_second: u32,
        now: DateTime<Utc>,
    ) -> Result<RateLimitOutcome, RateLimitError>;
}

// ============================================================================
// SECTION: Provider Client
// ============================================================================

/// Classification of a provider error, per §6/§7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Deadline, network error, provider 5xx, or provider-reported
    /// transient code; eligible for retry up to the budget.
    Transient,
    /// Invalid recipient, blocked content, or provider-reported permanent
    /// code; the message fails immediately.
    Permanent,
}

/// An error returned by [`ProviderClient::send`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("provider error ({kind:?}, code {code})")]
pub struct ProviderError {
    /// Transient vs. permanent classification.
    pub kind: ProviderErrorKind,
    /// Provider-reported or synthesized integer error code.
    pub code: i64,
}

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOutcome {
    /// Provider-assigned identifier, non-empty and unique to the provider.
    pub provider_sid: String,
}

/// Abstract outbound delivery capability (§4.8).
pub trait ProviderClient: Send + Sync {
    /// Sends `body` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] classified as transient or permanent.
    fn send(&self, to: &E164, body: &str) -> Result<ProviderOutcome, ProviderError>;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Injectable time source (§4.9).
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> DateTime<Utc>;
}

// ============================================================================
// SECTION: Scheduler
// ============================================================================

/// Errors returned by a [`Scheduler`] implementation.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler's backing channel or timer wheel is unavailable.
    #[error("scheduler unavailable: {0}")]
    Unavailable(String),
}

/// An event a delayed task resolves to once its deadline elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Re-run the compliance pipeline for this message (retry or
    /// quiet-hours/rate-limit reschedule).
    MessageReady(MessageId),
    /// Re-evaluate whether a campaign has drained to `COMPLETED`.
    CampaignTick(CampaignId),
}

/// Injectable delayed-task primitive for retries and quiet-hour
/// reschedules (§4.9). At-least-once invocation is required; duplicate
/// invocations are tolerated because every message transition is guarded.
pub trait Scheduler: Send + Sync {
    /// Schedules `event` to fire no earlier than `when`, identified by
    /// `key` for idempotent re-scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] when the task cannot be scheduled.
    fn delay(
        &self,
        key: &str,
        when: DateTime<Utc>,
        event: PipelineEvent,
    ) -> Result<(), SchedulerError>;
}

/// Alias retained for call sites that only need the literal wire value of an
/// attribute comparison (used by the segment evaluator's comparator logic).
pub type AttributeValue = Value;
