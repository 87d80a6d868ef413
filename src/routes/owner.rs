use crate::{AppState, handlers};
use axum::{Router, routing::put};

/// Owner Router Module
///
/// Mutations restricted to the applicant who created the application. These routes are not
/// behind `auth_middleware`: the handlers first look the application up (unknown ids answer
/// 404 to anyone), then authenticate the caller and compare them to the applicant.
pub fn owner_routes() -> Router<AppState> {
    Router::new()
        // PUT /applications/{id}
        // Replaces the cover letter. DELETE /applications/{id} withdraws the application.
        .route(
            "/applications/{id}",
            put(handlers::update_application).delete(handlers::delete_application),
        )
}
