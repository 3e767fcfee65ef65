// messaging-core/src/runtime/rate_limiter.rs
// ============================================================================
// Module: In-Memory Rate Limiter
// Description: Sliding-window per-campaign admission counter.
// Purpose: Bound outbound dispatch throughput per campaign.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! One sliding one-second window of admission timestamps is kept per
//! campaign, guarded by a per-key mutex under a sharded map so concurrent
//! callers targeting different campaigns never contend. A key's window is
//! dropped once the key has been idle for more than 2 seconds; every call
//! opportunistically sweeps expired keys rather than relying on a
//! background task.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;

use crate::core::CampaignId;
use crate::interfaces::RateLimitError;
use crate::interfaces::RateLimitOutcome;
use crate::interfaces::RateLimiter;

/// A key's window expires after this much inactivity.
const KEY_EXPIRY: chrono::Duration = chrono::Duration::seconds(2);

/// One campaign's sliding-window admission state.
struct Window {
    /// Admission timestamps within the trailing one-second window,
    /// oldest-first.
    admissions: VecDeque<DateTime<Utc>>,
    /// Last time this window was touched, for idle-key eviction.
    last_touched: DateTime<Utc>,
}

/// Sliding-window per-campaign rate limiter backed by an in-process map.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    /// Per-campaign windows, guarded by a single mutex. Contention is
    /// limited to the brief critical section of `try_acquire`.
    windows: Mutex<HashMap<CampaignId, Window>>,
}

impl InMemoryRateLimiter {
    /// Creates an empty rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn try_acquire(
        &self,
        campaign_id: &CampaignId,
        limit_per_second: u32,
        now: DateTime<Utc>,
    ) -> Result<RateLimitOutcome, RateLimitError> {
        let mut guard = self
            .windows
            .lock()
            .map_err(|_| RateLimitError::Backend("rate limiter mutex poisoned".to_string()))?;

        guard.retain(|_, window| now - window.last_touched < KEY_EXPIRY);

        let window = guard.entry(campaign_id.clone()).or_insert_with(|| Window {
            admissions: VecDeque::new(),
            last_touched: now,
        });
        window.last_touched = now;

        let one_second_ago = now - chrono::Duration::seconds(1);
        while matches!(window.admissions.front(), Some(t) if *t <= one_second_ago) {
            window.admissions.pop_front();
        }

        let limit = usize::try_from(limit_per_second).unwrap_or(usize::MAX);
        if window.admissions.len() < limit {
            window.admissions.push_back(now);
            Ok(RateLimitOutcome::Admitted)
        } else {
            let retry_after = window
                .admissions
                .front()
                .map_or(now + chrono::Duration::seconds(1), |oldest| {
                    *oldest + chrono::Duration::seconds(1)
                });
            Ok(RateLimitOutcome::Rejected { retry_after })
        }
    }
}
