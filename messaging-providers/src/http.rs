// messaging-providers/src/http.rs
// ============================================================================
// Module: HTTP Provider Client
// Description: Twilio-compatible outbound SMS dispatch over HTTP.
// Purpose: Implement ProviderClient by POSTing a form-encoded request and
//          classifying the result as transient or permanent.
// Dependencies: messaging-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! [`TwilioHttpProvider`] issues a bounded, synchronous POST against a
//! Twilio-shaped messaging endpoint: basic-auth credentials, a form body of
//! `To`/`From`/`Body`, and a JSON response carrying either `sid` on success
//! or `code`/`message` on failure. Every outbound call carries the
//! configured timeout as a hard deadline; a network failure or a 5xx
//! response is treated as transient, a well-formed 4xx error code is
//! classified per [`classify_error_code`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use messaging_core::E164;
use messaging_core::ProviderClient;
use messaging_core::ProviderError;
use messaging_core::ProviderErrorKind;
use messaging_core::ProviderOutcome;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::warn;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the Twilio-compatible HTTP provider.
#[derive(Debug, Clone)]
pub struct TwilioHttpProviderConfig {
    /// Base endpoint the provider POSTs message-send requests to.
    pub endpoint: String,
    /// Basic-auth account identifier.
    pub account_sid: String,
    /// Basic-auth secret.
    pub auth_token: String,
    /// Sender identity placed in the `From` form field.
    pub sender_id: String,
    /// Request timeout.
    pub timeout: Duration,
}

// ============================================================================
// SECTION: Wire Shapes
// ============================================================================

/// Successful response body shape.
#[derive(Debug, Deserialize)]
struct SendSuccess {
    /// Provider-assigned message identifier.
    sid: String,
}

/// Error response body shape.
#[derive(Debug, Deserialize)]
struct SendError {
    /// Provider-reported numeric error code.
    code: i64,
    /// Human-readable error message, logged but never persisted verbatim.
    #[serde(default)]
    message: String,
}

// ============================================================================
// SECTION: Error Classification
// ============================================================================

/// Classifies a provider-reported error code as transient or permanent,
/// per the taxonomy in §6/§7: invalid-recipient and not-a-mobile classes
/// are permanent; rate-limit, queue-overflow, and unreachable-handset
/// classes are transient. Unrecognized codes default to permanent, since a
/// code the provider considers final should not be retried blindly.
#[must_use]
pub fn classify_error_code(code: i64) -> ProviderErrorKind {
    match code {
        20_429 | 20_500 | 30_001 | 30_002 | 30_003 | 30_004 | 30_005 => ProviderErrorKind::Transient,
        _ => ProviderErrorKind::Permanent,
    }
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// [`ProviderClient`] implementation backed by a Twilio-compatible HTTP API.
pub struct TwilioHttpProvider {
    /// Client configuration.
    config: TwilioHttpProviderConfig,
    /// Underlying blocking HTTP client.
    client: Client,
}

impl TwilioHttpProvider {
    /// Builds a new provider from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the HTTP client cannot be constructed.
    pub fn new(config: TwilioHttpProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|_| ProviderError { kind: ProviderErrorKind::Transient, code: 0 })?;
        Ok(Self { config, client })
    }
}

impl ProviderClient for TwilioHttpProvider {
    fn send(&self, to: &E164, body: &str) -> Result<ProviderOutcome, ProviderError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&[("To", to.as_str()), ("From", self.config.sender_id.as_str()), ("Body", body)])
            .send()
            .map_err(|err| {
                warn!(recipient = %to, "provider request failed: {}", classify_transport_error(&err));
                ProviderError { kind: ProviderErrorKind::Transient, code: 0 }
            })?;

        let status = response.status();
        if status.is_success() {
            let success: SendSuccess = response
                .json()
                .map_err(|_| ProviderError { kind: ProviderErrorKind::Transient, code: 0 })?;
            return Ok(ProviderOutcome { provider_sid: success.sid });
        }

        if status.is_server_error() {
            return Err(ProviderError { kind: ProviderErrorKind::Transient, code: i64::from(status.as_u16()) });
        }

        let error: SendError = response
            .json()
            .map_err(|_| ProviderError { kind: ProviderErrorKind::Permanent, code: i64::from(status.as_u16()) })?;
        warn!(recipient = %to, code = error.code, "provider rejected message: {}", error.message);
        Err(ProviderError { kind: classify_error_code(error.code), code: error.code })
    }
}

/// Describes a transport-level failure for logging, without leaking the
/// request body.
fn classify_transport_error(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "deadline exceeded"
    } else if err.is_connect() {
        "connection failed"
    } else {
        "request failed"
    }
}
