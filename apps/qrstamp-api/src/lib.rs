//! qrstamp API server
//!
//! REST endpoints for:
//! - Branded QR codes (logo overlay, optional text label, vCard payloads)
//! - Static device and polygon maps
//! - Reverse geocoding
//! - Signature page stamping with AES-256 protection

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod state;
pub mod vcard;
#[cfg(test)]
mod tests;

pub use config::Config;
pub use state::AppState;

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let body_limit = state.config.body_limit;

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // QR codes
        .route("/", get(handlers::qr_demo))
        .route("/qrcode", get(handlers::qr_code))
        .route("/vcard", get(handlers::vcard))
        // Maps
        .route("/staticmap", get(handlers::static_map))
        .route("/generate_map", get(handlers::static_map))
        .route("/get_address", get(handlers::get_address))
        .route("/polygon", get(handlers::polygon))
        // Signature pages
        .route("/process-pdf/", post(handlers::process_pdf))
        .route("/process-pdf", post(handlers::process_pdf))
        // Add middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
