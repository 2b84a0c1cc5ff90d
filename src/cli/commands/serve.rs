use std::sync::Arc;

use anyhow::Context;
use clap::Args;

use crate::app::{app, AppState};
use crate::auth::AuthSettings;
use crate::config::config;
use crate::database::{DatabaseManager, MemoryStoreProvider, PgStoreProvider, StoreProvider};

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Bind address (overrides SERVER_HOST)")]
    pub host: Option<String>,

    #[arg(long, help = "Listen port (overrides PROJECT_API_PORT/PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Serve from a process-local store instead of Postgres")]
    pub in_memory: bool,

    #[arg(long, help = "Apply database migrations before serving")]
    pub migrate: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let cfg = config();

    let stores: Arc<dyn StoreProvider> = if args.in_memory {
        tracing::warn!("Serving from the in-memory store; data is lost on exit");
        Arc::new(MemoryStoreProvider::new())
    } else {
        if args.migrate {
            let pool = DatabaseManager::main_pool()
                .await
                .context("failed to connect to the projects database")?;
            DatabaseManager::migrate(&pool)
                .await
                .context("failed to apply migrations")?;
        }
        Arc::new(
            PgStoreProvider::from_config()
                .await
                .context("failed to connect to the projects database")?,
        )
    };

    let auth = AuthSettings::from_config();
    if auth.jwt_secret.is_empty() {
        tracing::warn!("JWT secret is empty; every protected request will be rejected");
    }

    let mut state = AppState::new(stores, auth);
    if cfg.security.enable_cors {
        state = state.with_cors(cfg.security.cors_origins.clone());
    }

    let host = args.host.unwrap_or_else(|| cfg.server.host.clone());
    let port = args.port.unwrap_or(cfg.server.port);
    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Project Service API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    DatabaseManager::close_all().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
