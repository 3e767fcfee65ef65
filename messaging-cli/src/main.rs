#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )
)]
// messaging-cli/src/main.rs
// ============================================================================
// Module: Messaging CLI Entry Point
// Description: Operator command dispatcher for schema migration, campaign
//              triggering, message status inspection, and webhook replay.
// Purpose: Give operators a local, in-process way to drive and debug the
//          messaging platform's store and orchestrator without a running
//          HTTP server.
// Dependencies: clap, messaging-config, messaging-core, messaging-providers,
//               messaging-store-sqlite, serde_json, thiserror.
// ============================================================================

//! ## Overview
//! Every subcommand opens the `SQLite` store directly and operates
//! in-process: `trigger` wires the full [`messaging_core::CampaignOrchestrator`]
//! the same way the server binary does, while `status` and `replay-webhook`
//! only need the store and webhook ingestor. Inputs are untrusted CLI
//! arguments and are validated the same way the HTTP surface validates them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use messaging_config::Config;
use messaging_core::AuditSubject;
use messaging_core::CampaignId;
use messaging_core::CampaignOrchestrator;
use messaging_core::Clock;
use messaging_core::ConsentService;
use messaging_core::InMemoryRateLimiter;
use messaging_core::MessageId;
use messaging_core::ProviderClient;
use messaging_core::RateLimiter;
use messaging_core::Store;
use messaging_core::SystemClock;
use messaging_core::Timestamp;
use messaging_core::TokioScheduler;
use messaging_core::WebhookIngestor;
use messaging_core::runtime::InboundForm;
use messaging_core::runtime::StatusForm;
use messaging_providers::TwilioHttpProvider;
use messaging_providers::TwilioHttpProviderConfig;
use messaging_store_sqlite::SqliteStore;
use messaging_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "messaging-cli", disable_help_subcommand = true, arg_required_else_help = true)]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Applies schema migrations to a `SQLite` database file, creating it if
    /// absent.
    Migrate(MigrateCommand),
    /// Triggers a campaign's materialization and dispatch pipeline.
    Trigger(TriggerCommand),
    /// Prints a message's current state and audit history.
    Status(StatusCommand),
    /// Replays a webhook payload against the store, for debugging.
    ReplayWebhook(ReplayWebhookCommand),
}

/// Arguments for the `migrate` command.
#[derive(Args, Debug)]
struct MigrateCommand {
    /// Path to the `SQLite` database file.
    #[arg(long, value_name = "PATH")]
    dsn: PathBuf,
}

/// Arguments for the `trigger` command.
#[derive(Args, Debug)]
struct TriggerCommand {
    /// Campaign identifier to trigger.
    #[arg(long, value_name = "CAMPAIGN_ID")]
    campaign_id: String,
    /// Optional config file path (defaults to messaging.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Arguments for the `status` command.
#[derive(Args, Debug)]
struct StatusCommand {
    /// Path to the `SQLite` database file.
    #[arg(long, value_name = "PATH")]
    dsn: PathBuf,
    /// Message identifier to inspect.
    #[arg(long, value_name = "MESSAGE_ID")]
    message_id: String,
}

/// Which webhook endpoint `replay-webhook` emulates.
#[derive(ValueEnum, Copy, Clone, Debug)]
enum WebhookKind {
    /// Emulates `POST /webhooks/inbound`.
    Inbound,
    /// Emulates `POST /webhooks/status`.
    Status,
}

/// Arguments for the `replay-webhook` command.
#[derive(Args, Debug)]
struct ReplayWebhookCommand {
    /// Path to the `SQLite` database file.
    #[arg(long, value_name = "PATH")]
    dsn: PathBuf,
    /// Which webhook endpoint to emulate.
    #[arg(long, value_enum)]
    kind: WebhookKind,
    /// Sender's E.164 number (`inbound` only).
    #[arg(long)]
    from: Option<String>,
    /// Message text (`inbound` only).
    #[arg(long)]
    body: Option<String>,
    /// Provider message identifier (both kinds).
    #[arg(long)]
    message_sid: Option<String>,
    /// Provider status keyword (`status` only).
    #[arg(long)]
    message_status: Option<String>,
    /// Provider error code (`status` only).
    #[arg(long)]
    error_code: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate(command) => command_migrate(&command),
        Commands::Trigger(command) => command_trigger(&command),
        Commands::Status(command) => command_status(&command),
        Commands::ReplayWebhook(command) => command_replay_webhook(&command),
    }
}

// ============================================================================
// SECTION: Migrate Command
// ============================================================================

/// Executes the `migrate` command.
fn command_migrate(command: &MigrateCommand) -> CliResult<ExitCode> {
    SqliteStore::open(&SqliteStoreConfig::new(command.dsn.clone()))
        .map_err(|err| CliError::new(format!("failed to open/migrate {}: {err}", command.dsn.display())))?;
    write_stdout_line(&format!("migrated {}", command.dsn.display()))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Trigger Command
// ============================================================================

/// Executes the `trigger` command, wiring the full orchestrator in-process.
fn command_trigger(command: &TriggerCommand) -> CliResult<ExitCode> {
    let config = Config::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;

    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::open(&SqliteStoreConfig::new(PathBuf::from(&config.store.dsn)))
            .map_err(|err| CliError::new(format!("failed to open store: {err}")))?,
    );
    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new());
    let (account_sid, auth_token) = config.provider.split_credentials();
    let provider: Arc<dyn ProviderClient> = Arc::new(
        TwilioHttpProvider::new(TwilioHttpProviderConfig {
            endpoint: config.provider.endpoint.clone(),
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            sender_id: config.provider.sender_id.clone(),
            timeout: Duration::from_millis(config.provider.timeout_ms),
        })
        .map_err(|err| CliError::new(format!("failed to configure provider: {err}")))?,
    );
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (scheduler, events) = TokioScheduler::new();
    std::mem::drop(events);

    let orchestrator = CampaignOrchestrator::new(store, rate_limiter, provider, clock, Arc::new(scheduler));
    let campaign_id = CampaignId::from(command.campaign_id.as_str());
    let status = orchestrator
        .trigger(&campaign_id)
        .map_err(|err| CliError::new(format!("trigger failed: {err}")))?;

    write_stdout_line(&format!("{campaign_id} -> {status:?}"))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Status Command
// ============================================================================

/// Executes the `status` command.
fn command_status(command: &StatusCommand) -> CliResult<ExitCode> {
    let store = SqliteStore::open(&SqliteStoreConfig::new(command.dsn.clone()))
        .map_err(|err| CliError::new(format!("failed to open {}: {err}", command.dsn.display())))?;

    let message_id = MessageId::from(command.message_id.as_str());
    let message = store
        .get_message(&message_id)
        .map_err(|err| CliError::new(format!("lookup failed: {err}")))?
        .ok_or_else(|| CliError::new(format!("no such message: {}", command.message_id)))?;
    let history = store
        .list_audit(&AuditSubject::Message(message_id))
        .map_err(|err| CliError::new(format!("audit lookup failed: {err}")))?;

    let report = serde_json::json!({ "message": message, "history": history });
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| CliError::new(format!("failed to render report: {err}")))?;
    write_stdout_line(&rendered)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Replay-Webhook Command
// ============================================================================

/// Executes the `replay-webhook` command.
fn command_replay_webhook(command: &ReplayWebhookCommand) -> CliResult<ExitCode> {
    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::open(&SqliteStoreConfig::new(command.dsn.clone()))
            .map_err(|err| CliError::new(format!("failed to open {}: {err}", command.dsn.display())))?,
    );
    let ingestor = WebhookIngestor::new(store.clone(), ConsentService::new(store));
    let now = Timestamp::from(SystemClock.now());

    match command.kind {
        WebhookKind::Inbound => {
            let form = InboundForm {
                from: command.from.clone(),
                body: command.body.clone(),
                message_sid: command.message_sid.clone(),
            };
            let raw_payload = raw_inbound_payload(command);
            ingestor
                .handle_inbound(&raw_payload, form, now)
                .map_err(|err| CliError::new(format!("replay failed: {err}")))?;
        }
        WebhookKind::Status => {
            let form = StatusForm {
                message_sid: command.message_sid.clone(),
                message_status: command.message_status.clone(),
                error_code: command.error_code.clone(),
            };
            let raw_payload = raw_status_payload(command);
            ingestor
                .handle_status(&raw_payload, form, now)
                .map_err(|err| CliError::new(format!("replay failed: {err}")))?;
        }
    }

    write_stdout_line("replayed")?;
    Ok(ExitCode::SUCCESS)
}

/// Reconstructs a form-encoded payload for the raw-capture log, mirroring
/// what Twilio would have sent to `/webhooks/inbound`.
fn raw_inbound_payload(command: &ReplayWebhookCommand) -> String {
    let mut pairs = Vec::new();
    if let Some(from) = &command.from {
        pairs.push(format!("From={from}"));
    }
    if let Some(body) = &command.body {
        pairs.push(format!("Body={body}"));
    }
    if let Some(sid) = &command.message_sid {
        pairs.push(format!("MessageSid={sid}"));
    }
    pairs.join("&")
}

/// Reconstructs a form-encoded payload for the raw-capture log, mirroring
/// what Twilio would have sent to `/webhooks/status`.
fn raw_status_payload(command: &ReplayWebhookCommand) -> String {
    let mut pairs = Vec::new();
    if let Some(sid) = &command.message_sid {
        pairs.push(format!("MessageSid={sid}"));
    }
    if let Some(status) = &command.message_status {
        pairs.push(format!("MessageStatus={status}"));
    }
    if let Some(code) = &command.error_code {
        pairs.push(format!("ErrorCode={code}"));
    }
    pairs.join("&")
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}").map_err(|err| CliError::new(format!("stdout write failed: {err}")))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

