// messaging-core/src/core/time.rs
// ============================================================================
// Module: Messaging Timestamps
// Description: Canonical timestamp newtype used across the messaging core.
// Purpose: Wrap chrono's UTC instant with RFC3339 (de)serialization.
// Dependencies: chrono, serde
// ============================================================================

//! ## Overview
//! All wall-clock instants recorded by the messaging core flow through
//! [`Timestamp`], a thin wrapper over `chrono::DateTime<Utc>`. Keeping a
//! single type at this seam means stores, the orchestrator, and the HTTP
//! surface never have to reconcile differing clock representations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A UTC instant, serialized as an RFC3339 string at the storage/API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wraps an existing UTC instant.
    #[must_use]
    pub const fn new(at: DateTime<Utc>) -> Self {
        Self(at)
    }

    /// Returns the wrapped UTC instant.
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Returns the number of whole seconds since the Unix epoch.
    #[must_use]
    pub fn unix_seconds(&self) -> i64 {
        self.0.timestamp()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Default for Timestamp {
    /// Returns the Unix epoch, used as the zero value in transition fields
    /// that don't always carry an explicit timestamp.
    fn default() -> Self {
        Self(DateTime::UNIX_EPOCH)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
