use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregation (Public, Authenticated, Owner).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, owner, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{PostgresRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document aggregated from the `#[utoipa::path]` handlers and `ToSchema` models.
/// Served as JSON at `/listings/openapi.json` behind the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::get_listings, handlers::get_listing, handlers::create_listing,
        handlers::update_listing, handlers::delete_listing,
        handlers::create_application, handlers::get_applications, handlers::get_application,
        handlers::update_application, handlers::delete_application
    ),
    components(
        schemas(
            models::Listing, models::Application, models::ApplicationCount,
            models::ApplicationDetail, models::UpdatedApplication,
            models::CreateApplicationRequest, models::UpdateApplicationRequest,
            models::CreateListingRequest, models::UpdateListingRequest,
            error::ErrorBody,
        )
    ),
    tags(
        (name = "job-portal", description = "Job listings and applications API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// The shared, immutable state handed to every request: the persistence handle and the
/// loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access via the PgPool connection.
    pub repo: RepositoryState,
    /// Configuration: JWT secret, environment, bind settings.
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards the authenticated routes. The `AuthUser` extractor rejects the request with
/// 401 (no credentials) or 403 (invalid token) before the handler runs; on success the
/// decoded identity is attached to the request extensions for downstream extractors.
async fn auth_middleware(auth_user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(auth_user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware, and registers the
/// application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        // Documentation: Swagger UI for the listings/applications API.
        .merge(
            SwaggerUi::new("/listings/api-docs")
                .url("/listings/openapi.json", ApiDoc::openapi()),
        )
        // Public Routes: no authentication.
        .merge(public::public_routes())
        // Owner Routes: authenticate inside the handler, after the existence check.
        .merge(owner::owner_routes())
        // Authenticated Routes: rejected by `auth_middleware` without a valid token.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`: correlates every log line of a request through its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
