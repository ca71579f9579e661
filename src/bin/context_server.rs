//! context_server: REST server for address and LPA lookups.
//!
//! Reads config from env vars (see `AppConfig`):
//!   DATABASE_URL: Postgres/PostGIS connection string (optional)
//!   BIND_ADDR:    listen address (default: 0.0.0.0:3030)

use std::sync::Arc;

use anyhow::{Context, Result};
use planning_context::geocode::NominatimGeocoder;
use planning_context::lpa::LpaService;
use planning_context::server::{build_router, AppState};
use planning_context::{
    AddressContext, AddressLookupService, AppConfig, DatabaseConfig, DatabaseManager,
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,planning_context=debug,tower_http=info".into()),
        )
        .init();

    let db = match DatabaseConfig::from_app_config(&config) {
        Some(db_config) => {
            let db = DatabaseManager::new(db_config)
                .await
                .context("failed to connect to database")?;
            db.test_connection()
                .await
                .context("database connectivity check failed")?;
            Some(db)
        }
        None => {
            warn!("DATABASE_URL is not set; dataset lookups will fail until it is configured");
            None
        }
    };

    let (context, lpa) = match &db {
        Some(db) => {
            let store = Arc::new(db.context_store(config.lookup_max_concurrency));
            (
                AddressContext::new(store.clone()).with_timeout(config.lookup_timeout),
                LpaService::new(store),
            )
        }
        None => (AddressContext::unconfigured(), LpaService::unconfigured()),
    };

    let geocoder = NominatimGeocoder::new(config.nominatim.clone())
        .context("failed to build geocoder client")?;
    let lookup = AddressLookupService::new(Arc::new(geocoder), lpa, context);

    let app = build_router(AppState::new(lookup));

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!("context_server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(db) = db {
        db.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
