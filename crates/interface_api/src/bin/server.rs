//! HMO Core API server
//!
//! # Usage
//!
//! ```bash
//! # Against PostgreSQL (migrations run on startup)
//! API_DATABASE_URL=postgres://localhost/hmo cargo run --bin hmo-api
//!
//! # Without a database; data lives for the life of the process
//! API_STORAGE=memory cargo run --bin hmo-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Bind address (default: 0.0.0.0:8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - Token lifetime (default: 3600)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` / `API_DB_ACQUIRE_TIMEOUT_SECS` - Pool sizing (default: 10 / 10s)
//! * `API_STORAGE` - `postgres` or `memory` (default: postgres)
//! * `API_BENEFITS_FILE` - JSON benefit schedule overriding the built-in one
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default: info); `RUST_LOG` wins when set
//! * `API_LOG_FORMAT` - `text` or `json` (default: text)
//! * `API_ADMIN_USERNAME` / `API_ADMIN_PASSWORD` - Credentials for dev token issuance

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_claims::BenefitSchedule;
use infra_db::{create_pool, run_migrations, DatabaseConfig};
use interface_api::config::{ApiConfig, LogFormat, StorageBackend};
use interface_api::{create_router, AppState, Ports};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("loading API_* configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        storage = ?config.storage,
        "Starting HMO Core API server"
    );

    let benefits = match config.benefits_file {
        Some(ref path) => BenefitSchedule::from_file(path)
            .with_context(|| format!("loading benefit schedule from {}", path))?,
        None => BenefitSchedule::default(),
    };

    let ports = match config.storage {
        StorageBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db_config = DatabaseConfig::new(config.database_url.clone())
                .max_connections(config.db_max_connections)
                .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs));
            let pool = create_pool(db_config)
                .await
                .context("connecting to PostgreSQL")?;
            run_migrations(&pool).await.context("running migrations")?;
            Ports::postgres(pool)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data will not survive a restart");
            Ports::in_memory()
        }
    };

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server_addr()))?;
    let app = create_router(AppState::new(config, ports, benefits));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Registry with an env filter and a text or JSON fmt layer
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
