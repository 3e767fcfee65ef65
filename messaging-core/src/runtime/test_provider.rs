// messaging-core/src/runtime/test_provider.rs
// ============================================================================
// Module: Test Provider Client
// Description: Deterministic ProviderClient double keyed by (to, body).
// Purpose: Let tests and system-tests scenarios inject specific outcomes.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`TestProviderClient`] returns a pre-programmed outcome for a given
//! `(to, body)` pair, or a default success outcome with a synthesized
//! provider sid when no outcome was programmed. This lets system tests
//! exercise every branch of the dispatch stage without a network.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::core::E164;
use crate::interfaces::ProviderClient;
use crate::interfaces::ProviderError;
use crate::interfaces::ProviderOutcome;

/// Deterministic [`ProviderClient`] test double.
#[derive(Default)]
pub struct TestProviderClient {
    /// Programmed outcomes, keyed by `(to, body)`.
    outcomes: Mutex<HashMap<(String, String), Result<ProviderOutcome, ProviderError>>>,
    /// Counter used to synthesize provider sids for unprogrammed calls.
    sid_counter: AtomicU64,
}

impl TestProviderClient {
    /// Creates an empty test client; every call succeeds with a synthesized
    /// sid unless programmed otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Programs the outcome returned for the exact `(to, body)` pair.
    ///
    /// # Panics
    ///
    /// Never panics under normal use; a poisoned mutex is recovered rather
    /// than propagated.
    pub fn program(&self, to: &E164, body: &str, outcome: Result<ProviderOutcome, ProviderError>) {
        self.outcomes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert((to.as_str().to_string(), body.to_string()), outcome);
    }
}

impl ProviderClient for TestProviderClient {
    fn send(&self, to: &E164, body: &str) -> Result<ProviderOutcome, ProviderError> {
        let key = (to.as_str().to_string(), body.to_string());
        if let Some(outcome) = self
            .outcomes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&key)
        {
            return outcome.clone();
        }
        let seq = self.sid_counter.fetch_add(1, Ordering::Relaxed);
        Ok(ProviderOutcome {
            provider_sid: format!("TEST_SID_{seq}"),
        })
    }
}
