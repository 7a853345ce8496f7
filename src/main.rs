//! AuthGate Server — authentication gateway
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing;
use tracing_subscriber::{EnvFilter, fmt};

use authgate_api::{AppState, build_app};
use authgate_auth::user::seed_users;
use authgate_auth::{AuthOrchestrator, DirectorySync, InitContext, MemoryUserStore, PasswordHasher};
use authgate_core::config::AppConfig;
use authgate_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("AUTHGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting AuthGate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: User store + seed users ──────────────────────────
    let users = Arc::new(MemoryUserStore::new());
    let seeded = seed_users(users.as_ref(), &PasswordHasher::new(), &config.auth.users).await?;
    tracing::info!("Seeded {} local user(s)", seeded);

    // ── Step 2: Authentication ───────────────────────────────────
    // No directory client is linked into this binary, so an `ldap` block
    // fails initialization here.
    let ctx = InitContext::new(users);
    let orchestrator = Arc::new(AuthOrchestrator::initialize(&ctx, &config)?);

    // ── Step 3: Background directory sync ────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sync_handle = match orchestrator.registry().directory() {
        Some(directory) if directory.config().sync_interval_seconds > 0 => {
            let sync = DirectorySync::new(
                Arc::clone(directory),
                Duration::from_secs(directory.config().sync_interval_seconds),
            );
            let cancel = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                sync.run(cancel).await;
            }))
        }
        _ => None,
    };

    // ── Step 4: Build and start HTTP server ──────────────────────
    let addr = config.server.bind_address();
    let app = build_app(AppState::new(config, Arc::clone(&orchestrator)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("AuthGate server listening on {}", addr);

    // ── Step 5: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    if let Some(handle) = sync_handle {
        let _ = tokio::time::timeout(Duration::from_secs(10), handle).await;
    }

    tracing::info!("AuthGate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
