//! HTTP surface for address and LPA lookups.

mod error;
mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::lookup::AddressLookupService;

pub use error::ApiError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub lookup: AddressLookupService,
}

impl AppState {
    pub fn new(lookup: AddressLookupService) -> Self {
        Self { lookup }
    }
}

/// Build the full axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/address/lookup", post(handlers::address_lookup))
        .route("/api/lpa/lookup", post(handlers::lpa_lookup))
        .route("/api/lpa/by-point", post(handlers::lpa_by_point))
        .route("/api/lpa/stats", get(handlers::lpa_stats))
        .route("/api/lpa/list", get(handlers::lpa_list))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
