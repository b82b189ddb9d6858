//! # PDV Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Startup                                          │
//! │                                                                         │
//! │  tracing ─► ServerConfig::load ─► Database (migrations)                 │
//! │          ─► security settings (stored, else config defaults)            │
//! │          ─► session sweeper ─► axum::serve (graceful shutdown)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use pdv_core::SecuritySettings;
use pdv_db::{Database, DbConfig};
use pdv_server::{build_router, AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often idle sessions are swept from memory.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pdv=debug,sqlx=warn")),
        )
        .with_target(true)
        .init();

    info!("Starting PDV server...");

    let config = ServerConfig::load().context("failed to load configuration")?;
    info!(
        port = config.port,
        database = %config.database_path,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.max_connections),
    )
    .await
    .context("failed to open database")?;

    let security = load_security(&db, &config).await?;
    info!(
        timeout_minutes = security.inactivity_timeout_minutes,
        warning_minutes = security.warning_minutes,
        "Inactivity policy loaded"
    );

    let addr = config.socket_addr()?;
    let state = AppState::new(db.clone(), config, security);

    let sweeper = tokio::spawn(sweep_sessions(state.clone()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Stored settings win; configuration provides the first-run values.
async fn load_security(db: &Database, config: &ServerConfig) -> anyhow::Result<SecuritySettings> {
    match db.settings().security_settings().await? {
        Some(settings) if settings.validate().is_ok() => Ok(settings),
        Some(_) => {
            warn!("Stored security settings are invalid; using configuration");
            Ok(config.default_security())
        }
        None => Ok(config.default_security()),
    }
}

async fn sweep_sessions(state: AppState) {
    let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        let removed = state.sessions.purge_expired(Utc::now());
        if removed > 0 {
            info!(removed, remaining = state.sessions.len(), "Expired sessions purged");
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
