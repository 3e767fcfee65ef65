// messaging-config/src/config.rs
// ============================================================================
// Module: Messaging Configuration
// Description: Configuration loading and validation for the messaging
//              platform.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, toml, chrono, chrono-tz
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path
//! limits. Missing required keys, or values outside documented bounds, fail
//! the load rather than being silently defaulted past a hard limit. Unknown
//! keys are ignored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "messaging.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "MESSAGING_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum allowed provider request timeout in milliseconds.
pub(crate) const MIN_PROVIDER_TIMEOUT_MS: u64 = 100;
/// Maximum allowed provider request timeout in milliseconds.
pub(crate) const MAX_PROVIDER_TIMEOUT_MS: u64 = 60_000;
/// Default provider request timeout in milliseconds.
pub(crate) const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 10_000;
/// Maximum allowed worker pool size.
pub(crate) const MAX_WORKERS_COUNT: usize = 1024;
/// Default worker pool size.
pub(crate) const DEFAULT_WORKERS_COUNT: usize = 8;
/// Maximum allowed shutdown grace period in seconds.
pub(crate) const MAX_SHUTDOWN_GRACE_SECONDS: u64 = 3600;
/// Default shutdown grace period in seconds.
pub(crate) const DEFAULT_SHUTDOWN_GRACE_SECONDS: u64 = 30;
/// Default HTTP bind address.
const DEFAULT_SERVER_BIND: &str = "0.0.0.0:8080";
/// Default log level.
const DEFAULT_LOG_LEVEL: &str = "info";
/// Default quiet-hours start (24-hour clock, `HH:MM`).
const DEFAULT_QUIET_START: &str = "22:00";
/// Default quiet-hours end (24-hour clock, `HH:MM`).
const DEFAULT_QUIET_END: &str = "08:00";
/// Default campaign timezone (IANA name).
const DEFAULT_TIMEZONE: &str = "UTC";

// ============================================================================
// SECTION: Configuration Root
// ============================================================================

/// Root configuration for the messaging platform.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Persistent store configuration.
    pub store: StoreConfig,
    /// Outbound provider configuration.
    pub provider: ProviderConfig,
    /// Rate limiter configuration.
    #[serde(default)]
    pub ratelimiter: RateLimiterConfig,
    /// Worker pool configuration.
    #[serde(default)]
    pub workers: WorkersConfig,
    /// Graceful shutdown configuration.
    #[serde(default)]
    pub shutdown: ShutdownConfig,
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
    /// Campaign quiet-hours defaults.
    #[serde(default)]
    pub campaign: CampaignDefaultsConfig,
}

impl Config {
    /// Loads configuration from disk using the default resolution rules: an
    /// explicit `path`, else the `MESSAGING_CONFIG` environment variable,
    /// else [`DEFAULT_CONFIG_NAME`] in the current directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, exceeds the
    /// size limit, is not valid UTF-8 or TOML, or fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store.validate()?;
        self.provider.validate()?;
        self.ratelimiter.validate()?;
        self.workers.validate()?;
        self.shutdown.validate()?;
        self.server.validate()?;
        self.log.validate()?;
        self.campaign.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Persistent store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Connection string for the backing store (a filesystem path for the
    /// SQLite-backed store).
    pub dsn: String,
}

impl StoreConfig {
    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dsn.trim().is_empty() {
            return Err(ConfigError::Invalid("store.dsn must be set".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Rate Limiter
// ============================================================================

/// Rate limiter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimiterConfig {
    /// Selected rate limiter backend.
    #[serde(default)]
    pub backend: RateLimiterBackend,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self { backend: RateLimiterBackend::default() }
    }
}

impl RateLimiterConfig {
    /// Validates rate limiter configuration.
    const fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Supported rate limiter backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RateLimiterBackend {
    /// Sliding-window rate limiter held in process memory.
    #[default]
    InMemory,
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Outbound provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Credentials for the outbound provider, `account_sid:auth_token`.
    pub credentials: String,
    /// Sender identity placed in outbound message envelopes.
    #[serde(rename = "senderId")]
    pub sender_id: String,
    /// Base URL the provider's send endpoint is POSTed to.
    pub endpoint: String,
    /// Request deadline in milliseconds for every outbound provider call.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

/// Default value for [`ProviderConfig::timeout_ms`].
const fn default_provider_timeout_ms() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_MS
}

impl ProviderConfig {
    /// Validates provider configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.credentials.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.credentials must be set".to_string()));
        }
        if self.sender_id.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.senderId must be set".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.endpoint must be set".to_string()));
        }
        if !(MIN_PROVIDER_TIMEOUT_MS..=MAX_PROVIDER_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "provider.timeout_ms must be between {MIN_PROVIDER_TIMEOUT_MS} and {MAX_PROVIDER_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    /// Splits [`Self::credentials`] into `(account_sid, auth_token)`.
    ///
    /// The convention is `account_sid:auth_token`; a value with no colon is
    /// treated as an auth token with an empty account sid.
    #[must_use]
    pub fn split_credentials(&self) -> (&str, &str) {
        self.credentials.split_once(':').unwrap_or(("", self.credentials.as_str()))
    }
}

// ============================================================================
// SECTION: Workers
// ============================================================================

/// Worker pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    /// Maximum number of messages dispatched concurrently.
    #[serde(default = "default_workers_count")]
    pub count: usize,
}

/// Default value for [`WorkersConfig::count`].
const fn default_workers_count() -> usize {
    DEFAULT_WORKERS_COUNT
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self { count: default_workers_count() }
    }
}

impl WorkersConfig {
    /// Validates worker pool configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 {
            return Err(ConfigError::Invalid("workers.count must be greater than zero".to_string()));
        }
        if self.count > MAX_WORKERS_COUNT {
            return Err(ConfigError::Invalid(format!("workers.count must not exceed {MAX_WORKERS_COUNT}")));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Shutdown
// ============================================================================

/// Graceful shutdown configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    /// Seconds workers are given to drain in-flight messages before
    /// in-flight work is left `QUEUED` for the next start.
    #[serde(default = "default_shutdown_grace_seconds", rename = "graceSeconds")]
    pub grace_seconds: u64,
}

/// Default value for [`ShutdownConfig::grace_seconds`].
const fn default_shutdown_grace_seconds() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_SECONDS
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_seconds: default_shutdown_grace_seconds() }
    }
}

impl ShutdownConfig {
    /// Validates shutdown configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_seconds > MAX_SHUTDOWN_GRACE_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "shutdown.graceSeconds must not exceed {MAX_SHUTDOWN_GRACE_SECONDS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the webhook and trigger HTTP surface.
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

/// Default value for [`ServerConfig::bind`].
fn default_server_bind() -> String {
    DEFAULT_SERVER_BIND.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_server_bind() }
    }
}

impl ServerConfig {
    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid("server.bind must be a valid socket address".to_string()))?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Minimum emitted log level.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output encoding for log lines.
    #[serde(default)]
    pub format: LogFormat,
}

/// Default value for [`LogConfig::level`].
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: LogFormat::default() }
    }
}

impl LogConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.level.as_str()) {
            return Err(ConfigError::Invalid(format!("log.level must be one of {LEVELS:?}")));
        }
        Ok(())
    }
}

/// Supported log line encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Newline-delimited JSON, suited to log aggregation.
    #[default]
    Json,
    /// Human-readable text, suited to local development.
    Pretty,
}

// ============================================================================
// SECTION: Campaign Defaults
// ============================================================================

/// Default quiet-hours window applied to campaigns that do not specify one.
#[derive(Debug, Clone, Deserialize)]
pub struct CampaignDefaultsConfig {
    /// Quiet-hours start, 24-hour clock (`HH:MM`).
    #[serde(default = "default_quiet_start")]
    pub default_quiet_start: String,
    /// Quiet-hours end, 24-hour clock (`HH:MM`).
    #[serde(default = "default_quiet_end")]
    pub default_quiet_end: String,
    /// IANA timezone name quiet hours are evaluated against.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

/// Default value for [`CampaignDefaultsConfig::default_quiet_start`].
fn default_quiet_start() -> String {
    DEFAULT_QUIET_START.to_string()
}

/// Default value for [`CampaignDefaultsConfig::default_quiet_end`].
fn default_quiet_end() -> String {
    DEFAULT_QUIET_END.to_string()
}

/// Default value for [`CampaignDefaultsConfig::default_timezone`].
fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

impl Default for CampaignDefaultsConfig {
    fn default() -> Self {
        Self {
            default_quiet_start: default_quiet_start(),
            default_quiet_end: default_quiet_end(),
            default_timezone: default_timezone(),
        }
    }
}

impl CampaignDefaultsConfig {
    /// Validates campaign default configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        parse_clock(&self.default_quiet_start, "campaign.default_quiet_start")?;
        parse_clock(&self.default_quiet_end, "campaign.default_quiet_end")?;
        Tz::from_str(&self.default_timezone)
            .map_err(|_| ConfigError::Invalid("campaign.default_timezone is not a recognized IANA name".to_string()))?;
        Ok(())
    }
}

/// Parses a `HH:MM` clock string, returning a descriptive error on failure.
fn parse_clock(value: &str, field: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| ConfigError::Invalid(format!("{field} must be HH:MM")))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from an explicit argument, the environment, or
/// the default filename, in that order.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only panic-based assertions are permitted."
)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_toml(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn minimal_config_loads_with_defaults_applied() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///var/lib/messaging/messaging.db"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"
            "#,
        );
        let config = Config::load(Some(file.path())).expect("load config");
        assert_eq!(config.workers.count, DEFAULT_WORKERS_COUNT);
        assert_eq!(config.shutdown.grace_seconds, DEFAULT_SHUTDOWN_GRACE_SECONDS);
        assert_eq!(config.provider.timeout_ms, DEFAULT_PROVIDER_TIMEOUT_MS);
        assert_eq!(config.server.bind, DEFAULT_SERVER_BIND);
        assert_eq!(config.log.level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.ratelimiter.backend, RateLimiterBackend::InMemory);
        assert_eq!(config.campaign.default_timezone, "UTC");
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///tmp/messaging.db"
            unexpected = "value"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"

            [totally_unknown_section]
            whatever = 1
            "#,
        );
        assert!(Config::load(Some(file.path())).is_ok());
    }

    #[test]
    fn missing_store_section_fails_closed() {
        let file = write_toml(
            r#"
            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn empty_store_dsn_is_rejected() {
        let file = write_toml(
            r#"
            [store]
            dsn = "   "

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn workers_count_zero_is_rejected() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///tmp/messaging.db"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"

            [workers]
            count = 0
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn provider_timeout_out_of_range_is_rejected() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///tmp/messaging.db"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"
            timeout_ms = 999999
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn invalid_quiet_hour_format_is_rejected() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///tmp/messaging.db"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"

            [campaign]
            default_quiet_start = "not-a-time"
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unrecognized_timezone_is_rejected() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///tmp/messaging.db"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"

            [campaign]
            default_timezone = "Not/A_Zone"
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn invalid_bind_address_is_rejected() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///tmp/messaging.db"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"

            [server]
            bind = "not-an-address"
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///tmp/messaging.db"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"

            [log]
            level = "verbose"
            "#,
        );
        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = Config::load(Some(Path::new("/nonexistent/path/messaging.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn fully_specified_config_round_trips() {
        let file = write_toml(
            r#"
            [store]
            dsn = "sqlite:///var/lib/messaging/messaging.db"

            [ratelimiter]
            backend = "in_memory"

            [provider]
            credentials = "sk_live_test"
            senderId = "+15550001111"
            endpoint = "https://messaging.example.com/v1/messages"
            timeout_ms = 5000

            [workers]
            count = 16

            [shutdown]
            graceSeconds = 45

            [server]
            bind = "127.0.0.1:9090"

            [log]
            level = "debug"
            format = "pretty"

            [campaign]
            default_quiet_start = "21:30"
            default_quiet_end = "07:15"
            default_timezone = "America/New_York"
            "#,
        );
        let config = Config::load(Some(file.path())).expect("load config");
        assert_eq!(config.workers.count, 16);
        assert_eq!(config.shutdown.grace_seconds, 45);
        assert_eq!(config.provider.timeout_ms, 5000);
        assert_eq!(config.server.bind, "127.0.0.1:9090");
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert_eq!(config.campaign.default_timezone, "America/New_York");
    }

    #[test]
    fn split_credentials_separates_sid_and_token() {
        let config = ProviderConfig {
            credentials: "AC_test:secret_token".to_string(),
            sender_id: "+15550001111".to_string(),
            endpoint: "https://messaging.example.com/v1/messages".to_string(),
            timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
        };
        assert_eq!(config.split_credentials(), ("AC_test", "secret_token"));
    }

    #[test]
    fn split_credentials_without_colon_is_token_only() {
        let config = ProviderConfig {
            credentials: "opaque_token".to_string(),
            sender_id: "+15550001111".to_string(),
            endpoint: "https://messaging.example.com/v1/messages".to_string(),
            timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
        };
        assert_eq!(config.split_credentials(), ("", "opaque_token"));
    }
}
