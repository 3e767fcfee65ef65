// messaging-core/src/runtime/scheduler.rs
// ============================================================================
// Module: Scheduler Implementations
// Description: Delayed-task primitives for retries and quiet-hour
//              reschedules, plus the dispatch retry backoff function.
// Purpose: Provide a tokio-based Scheduler and a virtual-clock test double.
// Dependencies: crate::interfaces, tokio, rand
// ============================================================================

//! ## Overview
//! [`TokioScheduler`] spawns a `tokio::time::sleep_until` task per delayed
//! event and forwards it on an `mpsc` channel once its deadline elapses,
//! matching the async task style the teacher's broker and MCP crates use
//! for background work. [`FakeScheduler`] instead records pending events
//! and fires the ones whose deadline has passed when a test tells it to
//! "advance".

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::Instant as TokioInstant;
use tracing::warn;

use crate::interfaces::PipelineEvent;
use crate::interfaces::Scheduler;
use crate::interfaces::SchedulerError;

// ============================================================================
// SECTION: Backoff
// ============================================================================

/// Maximum backoff delay, in seconds, regardless of retry count.
const MAX_BACKOFF_SECONDS: i64 = 3600;

/// Computes the dispatch retry backoff for the `k`th transient retry:
/// `min(60 * 2^(k-1), 3600)` seconds, with +/-20% jitter. `k` is 1-indexed;
/// `k == 0` is treated as `k == 1`.
#[must_use]
pub fn backoff(retry_count: u32) -> chrono::Duration {
    backoff_with_rng(retry_count, &mut rand::thread_rng())
}

/// Testable variant of [`backoff`] taking an explicit RNG.
fn backoff_with_rng(retry_count: u32, rng: &mut impl Rng) -> chrono::Duration {
    let k = retry_count.max(1);
    let exponent = k.saturating_sub(1).min(6);
    let base = 60i64.saturating_mul(1i64 << exponent);
    let base = base.min(MAX_BACKOFF_SECONDS);
    let jitter_fraction = rng.gen_range(-0.2..=0.2);
    #[allow(
        clippy::cast_possible_truncation,
        reason = "jittered delay is bounded well within i64 range by MAX_BACKOFF_SECONDS"
    )]
    let jittered = (base as f64 * (1.0 + jitter_fraction)).round() as i64;
    chrono::Duration::seconds(jittered.max(1))
}

// ============================================================================
// SECTION: Tokio Scheduler
// ============================================================================

/// Reference [`Scheduler`] implementation using `tokio` timers.
#[derive(Clone)]
pub struct TokioScheduler {
    /// Channel events are forwarded on once their deadline elapses.
    sender: mpsc::UnboundedSender<PipelineEvent>,
}

impl TokioScheduler {
    /// Creates a scheduler paired with the receiver the orchestrator's
    /// driver loop consumes events from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Scheduler for TokioScheduler {
    fn delay(&self, key: &str, when: DateTime<Utc>, event: PipelineEvent) -> Result<(), SchedulerError> {
        let sender = self.sender.clone();
        let delay = (when - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(0));
        let deadline = TokioInstant::now() + delay;
        let key = key.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if sender.send(event).is_err() {
                warn!(key = %key, "scheduler event dropped: receiver closed");
            }
        });
        Ok(())
    }
}

// ============================================================================
// SECTION: Fake Scheduler
// ============================================================================

/// One pending delayed event.
struct PendingEvent {
    /// Deadline the event fires at.
    when: DateTime<Utc>,
    /// The event itself.
    event: PipelineEvent,
}

/// Deterministic [`Scheduler`] test double. Events are recorded rather
/// than spawned, and [`FakeScheduler::advance`] returns every event whose
/// deadline is at or before `now`.
#[derive(Default)]
pub struct FakeScheduler {
    /// Pending events, unordered; drained by `advance`.
    pending: Mutex<Vec<PendingEvent>>,
}

impl FakeScheduler {
    /// Creates an empty fake scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every pending event whose deadline is at or before `now`,
    /// removing them from the pending set.
    pub fn advance(&self, now: DateTime<Utc>) -> Vec<PipelineEvent> {
        let mut guard = self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let (ready, still_pending): (Vec<_>, Vec<_>) = guard.drain(..).partition(|p| p.when <= now);
        *guard = still_pending;
        ready.into_iter().map(|p| p.event).collect()
    }

    /// Returns the number of events still pending.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

impl Scheduler for FakeScheduler {
    fn delay(&self, _key: &str, when: DateTime<Utc>, event: PipelineEvent) -> Result<(), SchedulerError> {
        self.pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(PendingEvent { when, event });
        Ok(())
    }
}
