// messaging-config/src/lib.rs
// ============================================================================
// Module: Messaging Config Library
// Description: TOML configuration loading and validation for the messaging
//              platform.
// Purpose: Single source of truth for messaging.toml semantics.
// Dependencies: serde, toml, chrono, chrono-tz
// ============================================================================

//! ## Overview
//! `messaging-config` defines the canonical configuration model for the
//! messaging platform. Configuration is loaded from a TOML file located via
//! the `MESSAGING_CONFIG` environment variable, or a default filename if
//! unset. It provides strict, fail-closed validation: required keys missing,
//! or values outside documented bounds, fail the load rather than silently
//! falling back to a default past a hard limit. Unknown keys are ignored.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
