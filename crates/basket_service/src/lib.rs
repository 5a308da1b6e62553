//! Basket Service - HTTP surface for cart recommendations
//!
//! Serves the installed model to checkout clients and exposes catalog,
//! health and retrain endpoints.

pub mod api;
pub mod config;
pub mod errors;
pub mod service;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ServiceConfig;
pub use errors::ServiceError;
pub use service::{bootstrap, retrain, AppState, RetrainOutcome, SharedState};

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(api::index))
        .route("/health", get(api::health))
        .route("/api/products", get(api::products))
        .route("/api/product/:sku", get(api::product))
        .route("/api/recommendations", post(api::recommendations))
        .route("/api/retrain", post(api::retrain))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
