// messaging-providers/src/lib.rs
// ============================================================================
// Module: Messaging Providers
// Description: Outbound delivery adapters for the messaging platform.
// Purpose: Provide a production ProviderClient backed by a Twilio-compatible
//          HTTP API.
// Dependencies: messaging-core, reqwest
// ============================================================================

//! ## Overview
//! This crate supplies the one concrete [`messaging_core::ProviderClient`]
//! the platform ships: [`TwilioHttpProvider`], an HTTP adapter over a
//! Twilio-compatible messaging API. `messaging-core` depends only on the
//! trait; this crate is wired in at the composition root
//! (`messaging-server`/`messaging-cli`).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use http::TwilioHttpProvider;
pub use http::TwilioHttpProviderConfig;
pub use http::classify_error_code;
