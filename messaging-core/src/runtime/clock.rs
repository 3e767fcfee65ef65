// messaging-core/src/runtime/clock.rs
// ============================================================================
// Module: Clock Implementations
// Description: Wall-clock and deterministic test clocks.
// Purpose: Provide the reference Clock and a virtual-clock test double.
// Dependencies: crate::interfaces, chrono, std::sync
// ============================================================================

//! ## Overview
//! [`SystemClock`] reads the wall clock. [`FakeClock`] holds a manually
//! advanced instant so tests can drive quiet-hour and backoff logic
//! deterministically without sleeping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use chrono::DateTime;
use chrono::Utc;

use crate::interfaces::Clock;

// ============================================================================
// SECTION: System Clock
// ============================================================================

/// Reference [`Clock`] reading the real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// ============================================================================
// SECTION: Fake Clock
// ============================================================================

/// Deterministic [`Clock`] test double holding a manually set instant.
#[derive(Debug)]
pub struct FakeClock {
    /// Current virtual instant.
    current: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    /// Creates a fake clock starting at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Advances the virtual clock by `delta`, returning the new instant.
    pub fn advance(&self, delta: chrono::Duration) -> DateTime<Utc> {
        let mut guard = self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard += delta;
        *guard
    }

    /// Sets the virtual clock to exactly `at`.
    pub fn set(&self, at: DateTime<Utc>) {
        let mut guard = self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = at;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        self.current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .to_owned()
    }
}
