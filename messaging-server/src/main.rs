// messaging-server/src/main.rs
// ============================================================================
// Module: Messaging Server Binary
// Description: Composition root wiring config, store, provider, and
//              orchestrator into a running axum service.
// Purpose: Provide the deployable entry point for the messaging platform's
//          HTTP surface.
// Dependencies: messaging-config, messaging-core, messaging-providers,
//               messaging-store-sqlite, axum, tokio
// ============================================================================

//! ## Overview
//! Boots the platform: loads configuration, wires the SQLite store, the
//! Twilio-compatible HTTP provider, and the in-memory rate limiter into a
//! [`messaging_core::CampaignOrchestrator`], then serves the HTTP surface
//! until a shutdown signal arrives. Shutdown is cooperative: once the axum
//! server stops accepting connections, the process waits up to
//! `shutdown.graceSeconds` for in-flight scheduler tasks to settle before
//! exiting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use messaging_config::Config;
use messaging_core::CampaignOrchestrator;
use messaging_core::Clock;
use messaging_core::ConsentService;
use messaging_core::InMemoryRateLimiter;
use messaging_core::ProviderClient;
use messaging_core::RateLimiter;
use messaging_core::Store;
use messaging_core::SystemClock;
use messaging_core::TokioScheduler;
use messaging_core::WebhookIngestor;
use messaging_providers::TwilioHttpProvider;
use messaging_providers::TwilioHttpProviderConfig;
use messaging_server::AppState;
use messaging_store_sqlite::SqliteStore;
use messaging_store_sqlite::SqliteStoreConfig;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("messaging-server: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the server until shutdown. Separated from `main` so startup
/// failures surface as a single formatted line rather than a panic.
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(None)?;
    init_tracing(&config);

    let store: Arc<dyn Store> =
        Arc::new(SqliteStore::open(&SqliteStoreConfig::new(PathBuf::from(&config.store.dsn)))?);
    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(InMemoryRateLimiter::new());
    let (account_sid, auth_token) = config.provider.split_credentials();
    let provider: Arc<dyn ProviderClient> = Arc::new(TwilioHttpProvider::new(TwilioHttpProviderConfig {
        endpoint: config.provider.endpoint.clone(),
        account_sid: account_sid.to_string(),
        auth_token: auth_token.to_string(),
        sender_id: config.provider.sender_id.clone(),
        timeout: Duration::from_millis(config.provider.timeout_ms),
    })?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (scheduler, events) = TokioScheduler::new();

    let orchestrator = Arc::new(CampaignOrchestrator::new(
        store.clone(),
        rate_limiter,
        provider,
        clock.clone(),
        Arc::new(scheduler),
    ));
    tokio::spawn(orchestrator.clone().run(events));

    let ingestor = WebhookIngestor::new(store.clone(), ConsentService::new(store.clone()));
    let state = AppState { store, ingestor, orchestrator, clock };

    let addr: std::net::SocketAddr = config.server.bind.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(bind = %addr, "messaging-server listening");

    axum::serve(listener, messaging_server::router(state)).with_graceful_shutdown(shutdown_signal()).await?;

    info!(grace_seconds = config.shutdown.grace_seconds, "draining in-flight scheduler tasks");
    tokio::time::sleep(Duration::from_secs(config.shutdown.grace_seconds)).await;
    Ok(())
}

/// Resolves once an operator-initiated shutdown signal arrives.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to install ctrl-c handler; shutdown signal will never fire");
        std::future::pending::<()>().await;
    }
}

/// Initializes the global tracing subscriber from `config.log`.
fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log.level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log.format {
        messaging_config::LogFormat::Json => builder.json().init(),
        messaging_config::LogFormat::Pretty => builder.pretty().init(),
    }
}
