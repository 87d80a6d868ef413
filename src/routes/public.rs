use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated, read-only endpoints.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers and container orchestration.
        .route("/health", get(handlers::health))
        // GET /listings
        // Every listing as a JSON array.
        .route("/listings", get(handlers::get_listings))
        // GET /listings/{id}
        // A single listing, or 404 with "There are no listings with an id of '<id>'".
        .route("/listings/{id}", get(handlers::get_listing))
}
