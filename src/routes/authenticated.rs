use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` layer applied in `create_router`:
/// requests without a bearer token get 401, requests with an invalid one get 403, and the
/// handlers receive the decoded `AuthUser`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Applications ---
        // POST /applications
        // Submits an application. Duplicate (applicant, listing) pairs answer 409.
        // GET /applications
        // Applications the caller submitted or received through their companies.
        .route(
            "/applications",
            post(handlers::create_application).get(handlers::get_applications),
        )
        // GET /applications/{id}
        // One application with its offer count. PUT/DELETE live in the owner router.
        .route("/applications/{id}", get(handlers::get_application))
        // --- Listing management (Client users) ---
        // POST /listings
        // Publishes a listing for a company owned by the caller.
        .route("/listings", post(handlers::create_listing))
        // PUT/DELETE /listings/{id}
        // Modify or remove a listing of one of the caller's companies.
        .route(
            "/listings/{id}",
            put(handlers::update_listing).delete(handlers::delete_listing),
        )
}
