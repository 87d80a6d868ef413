use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody},
    models::{
        Application, ApplicationDetail, CreateApplicationRequest, CreateListingRequest,
        Listing, UpdateApplicationRequest, UpdateListingRequest, UpdatedApplication,
    },
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

// --- Response Messages ---

pub const LISTING_NOT_IN_DB: &str = "Listing doesn't exist";
pub const COMPANY_NOT_IN_DB: &str = "Company doesn't exist";
pub const USER_NOT_IN_DB: &str = "User doesn't exist";
pub const LISTING_COMPANY_MISMATCH: &str = "Listing doesn't belong to this company";
pub const DUPLICATE_APPLICATION: &str = "You've already created an application on this listing";
pub const APPLICATION_NOT_FOUND: &str = "Application not found";
pub const COVER_LETTER_MANDATORY: &str = "Cover letter is mandatory";
pub const NOT_APPLICATION_OWNER: &str =
    "Unauthorized access: you cannot update or delete another user's application";
pub const NOT_APPLICATION_VIEWER: &str =
    "Unauthorized access: you cannot view another user's application";
pub const APPLY_ON_BEHALF: &str =
    "Unauthorized access: you cannot apply on behalf of another user";
pub const NOT_LISTING_OWNER: &str =
    "Unauthorized access: you cannot manage another client's listings";
pub const APPLICATION_UPDATED: &str = "Your Application is updated successfully";
pub const APPLICATION_DELETED: &str = "Your Application was successfully deleted";
pub const LISTING_DELETED: &str = "Listing was successfully deleted";
pub const MALFORMED_BODY: &str = "Malformed request body";

// --- Request Helpers ---

/// Ids arrive as free-form path/body strings; anything that is not a UUID cannot match a row.
fn parse_id(raw: &str) -> Option<Uuid> {
    Uuid::parse_str(raw.trim()).ok()
}

/// Decodes a JSON body into `T`. An empty body decodes as `T::default()` so that required
/// field checks, not the extractor, decide the response. Decoder details stay in the logs.
fn parse_json<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!("request body rejected: {}", e);
        ApiError::bad_request(MALFORMED_BODY)
    })
}

fn missing_fields_error(missing: &[&str]) -> ApiError {
    ApiError::bad_request(format!("Missing required fields: {}", missing.join(", ")))
}

fn listing_not_found(raw_id: &str) -> ApiError {
    ApiError::not_found(format!("There are no listings with an id of '{raw_id}'"))
}

async fn find_application(state: &AppState, raw_id: &str) -> ApiResult<ApplicationDetail> {
    let Some(id) = parse_id(raw_id) else {
        return Err(ApiError::not_found(APPLICATION_NOT_FOUND));
    };
    state
        .repo
        .get_application(id)
        .await?
        .ok_or_else(|| ApiError::not_found(APPLICATION_NOT_FOUND))
}

async fn find_listing(state: &AppState, raw_id: &str) -> ApiResult<Listing> {
    let Some(id) = parse_id(raw_id) else {
        return Err(listing_not_found(raw_id));
    };
    state
        .repo
        .get_listing(id)
        .await?
        .ok_or_else(|| listing_not_found(raw_id))
}

/// Mutation is reserved to the applicant who submitted the application.
fn ensure_applicant(application: &Application, user: &AuthUser) -> ApiResult<()> {
    if application.applicant_id != user.id {
        tracing::warn!(
            application_id = %application.id,
            user_id = %user.id,
            "rejected mutation of another user's application"
        );
        return Err(ApiError::unauthorized(NOT_APPLICATION_OWNER));
    }
    Ok(())
}

/// Listings are managed by the Client that owns their company.
async fn ensure_company_client(state: &AppState, company_id: Uuid, user: &AuthUser) -> ApiResult<()> {
    match state.repo.get_company(company_id).await? {
        Some(company) if company.client_id == user.id => Ok(()),
        _ => Err(ApiError::unauthorized(NOT_LISTING_OWNER)),
    }
}

// --- Health ---

/// health
///
/// [Public Route] Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

// --- Listings ---

/// get_listings
///
/// [Public Route] Lists every listing, newest first.
#[utoipa::path(
    get,
    path = "/listings",
    responses(
        (status = 200, description = "All listings", body = [Listing]),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_listings(State(state): State<AppState>) -> ApiResult<Json<Vec<Listing>>> {
    let listings = state.repo.get_listings().await?;
    Ok(Json(listings))
}

/// get_listing
///
/// [Public Route] Retrieves a single listing. Responds 404 and stops when no row matches.
#[utoipa::path(
    get,
    path = "/listings/{id}",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Found", body = Listing),
        (status = 404, description = "No listing with this id", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Listing>> {
    let listing = find_listing(&state, &id).await?;
    Ok(Json(listing))
}

/// create_listing
///
/// [Authenticated Route] Publishes a listing for one of the caller's companies.
#[utoipa::path(
    post,
    path = "/listings",
    request_body = CreateListingRequest,
    responses(
        (status = 201, description = "Created", body = Listing),
        (status = 400, description = "Missing fields or unknown company", body = ErrorBody),
        (status = 401, description = "Not authenticated, or not the company's client", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody)
    )
)]
pub async fn create_listing(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    let payload: CreateListingRequest = parse_json(&body)?;
    let (raw_company_id, new) = payload
        .validate()
        .map_err(|missing| missing_fields_error(&missing))?;

    let company = match parse_id(&raw_company_id) {
        Some(id) => state.repo.get_company(id).await?,
        None => None,
    }
    .ok_or_else(|| ApiError::bad_request(COMPANY_NOT_IN_DB))?;

    if company.client_id != user.id {
        return Err(ApiError::unauthorized(NOT_LISTING_OWNER));
    }

    let listing = state.repo.create_listing(company.id, new).await?;

    tracing::info!(listing_id = %listing.id, company_id = %company.id, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

/// update_listing
///
/// [Authenticated Route] Partially updates a listing owned by the caller's company.
#[utoipa::path(
    put,
    path = "/listings/{id}",
    params(("id" = String, Path, description = "Listing ID")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated", body = Listing),
        (status = 401, description = "Not authenticated, or not the company's client", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 404, description = "No listing with this id", body = ErrorBody)
    )
)]
pub async fn update_listing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Listing>> {
    let listing = find_listing(&state, &id).await?;
    ensure_company_client(&state, listing.company_id, &user).await?;

    let payload: UpdateListingRequest = parse_json(&body)?;
    let updated = state
        .repo
        .update_listing(listing.id, payload)
        .await?
        .ok_or_else(|| listing_not_found(&id))?;

    tracing::info!(listing_id = %updated.id, "listing updated");
    Ok(Json(updated))
}

/// delete_listing
///
/// [Authenticated Route] Removes a listing owned by the caller's company. Its applications
/// are removed with it (ON DELETE CASCADE).
#[utoipa::path(
    delete,
    path = "/listings/{id}",
    params(("id" = String, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Deleted", body = String),
        (status = 401, description = "Not authenticated, or not the company's client", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 404, description = "No listing with this id", body = ErrorBody)
    )
)]
pub async fn delete_listing(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<&'static str>> {
    let listing = find_listing(&state, &id).await?;
    ensure_company_client(&state, listing.company_id, &user).await?;

    if !state.repo.delete_listing(listing.id).await? {
        return Err(listing_not_found(&id));
    }

    tracing::info!(listing_id = %listing.id, "listing deleted");
    Ok(Json(LISTING_DELETED))
}

// --- Applications ---

/// create_application
///
/// [Authenticated Route] Submits an application to a listing.
///
/// Checks run in order: required fields, listing, company, applicant, listing/company
/// consistency, applicant is the caller. The duplicate check is the database's unique
/// index on (applicant, listing).
#[utoipa::path(
    post,
    path = "/applications",
    request_body = CreateApplicationRequest,
    responses(
        (status = 201, description = "Created", body = Application),
        (status = 400, description = "Missing fields or unknown listing/company/user", body = ErrorBody),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 409, description = "Already applied to this listing", body = ErrorBody)
    )
)]
pub async fn create_application(
    user: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Application>)> {
    let payload: CreateApplicationRequest = parse_json(&body)?;
    let new = payload.validate().map_err(|missing| missing_fields_error(&missing))?;

    let listing = match parse_id(&new.listing_id) {
        Some(id) => state.repo.get_listing(id).await?,
        None => None,
    }
    .ok_or_else(|| ApiError::bad_request(LISTING_NOT_IN_DB))?;

    let company = match parse_id(&new.company_id) {
        Some(id) => state.repo.get_company(id).await?,
        None => None,
    }
    .ok_or_else(|| ApiError::bad_request(COMPANY_NOT_IN_DB))?;

    let applicant = match parse_id(&new.applicant_id) {
        Some(id) => state.repo.get_user(id).await?,
        None => None,
    }
    .ok_or_else(|| ApiError::bad_request(USER_NOT_IN_DB))?;

    if listing.company_id != company.id {
        return Err(ApiError::bad_request(LISTING_COMPANY_MISMATCH));
    }

    if applicant.id != user.id {
        return Err(ApiError::unauthorized(APPLY_ON_BEHALF));
    }

    let created = state
        .repo
        .create_application(applicant.id, listing.id, company.id, new.cover_letter)
        .await?;

    match created {
        Some(application) => {
            tracing::info!(
                application_id = %application.id,
                listing_id = %listing.id,
                applicant_id = %applicant.id,
                "application created"
            );
            Ok((StatusCode::CREATED, Json(application)))
        }
        None => Err(ApiError::conflict(DUPLICATE_APPLICATION)),
    }
}

/// get_applications
///
/// [Authenticated Route] Lists the applications the caller submitted, plus those received
/// by companies the caller owns.
#[utoipa::path(
    get,
    path = "/applications",
    responses(
        (status = 200, description = "Applications visible to the caller", body = [Application]),
        (status = 401, description = "Not authenticated", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody)
    )
)]
pub async fn get_applications(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Application>>> {
    let applications = state.repo.get_applications_for_user(user.id).await?;
    Ok(Json(applications))
}

/// get_application
///
/// [Authenticated Route] Retrieves one application with its `_count.offers`. Visible to the
/// applicant and to the client owning the application's company.
#[utoipa::path(
    get,
    path = "/applications/{id}",
    params(("id" = String, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Found", body = ApplicationDetail),
        (status = 401, description = "Not authenticated, or not allowed to view", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 404, description = "Application not found", body = ErrorBody)
    )
)]
pub async fn get_application(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApplicationDetail>> {
    let detail = find_application(&state, &id).await?;

    if detail.application.applicant_id != user.id {
        let owns_company = state
            .repo
            .get_company(detail.application.company_id)
            .await?
            .is_some_and(|company| company.client_id == user.id);
        if !owns_company {
            return Err(ApiError::unauthorized(NOT_APPLICATION_VIEWER));
        }
    }

    Ok(Json(detail))
}

/// update_application
///
/// [Owner Route] Replaces the cover letter of the caller's application.
///
/// Existence is checked before authentication, so an unknown id answers 404 even to an
/// anonymous caller. Then: 401 without a token, 403 on an invalid token, 401 when the
/// caller is not the applicant, 409 without a cover letter.
#[utoipa::path(
    put,
    path = "/applications/{id}",
    params(("id" = String, Path, description = "Application ID")),
    request_body = UpdateApplicationRequest,
    responses(
        (status = 200, description = "Updated", body = UpdatedApplication),
        (status = 401, description = "Not authenticated, or not the applicant", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 404, description = "Application not found", body = ErrorBody),
        (status = 409, description = "Cover letter is mandatory", body = ErrorBody)
    )
)]
pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: Result<AuthUser, ApiError>,
    body: Bytes,
) -> ApiResult<Json<UpdatedApplication>> {
    let detail = find_application(&state, &id).await?;
    let user = auth?;
    ensure_applicant(&detail.application, &user)?;

    // Clients often echo the whole object back. Only a string `coverLetter` on a JSON
    // object counts; anything else carries no cover letter.
    let body: serde_json::Value = parse_json(&body)?;
    let payload = UpdateApplicationRequest {
        cover_letter: body
            .get("coverLetter")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
    };

    let cover_letter = payload
        .cover_letter()
        .ok_or_else(|| ApiError::conflict(COVER_LETTER_MANDATORY))?
        .to_string();

    let application = state
        .repo
        .update_cover_letter(detail.application.id, cover_letter)
        .await?
        .ok_or_else(|| ApiError::not_found(APPLICATION_NOT_FOUND))?;

    tracing::info!(application_id = %application.id, "application updated");
    Ok(Json(UpdatedApplication {
        application,
        response: APPLICATION_UPDATED.to_string(),
    }))
}

/// delete_application
///
/// [Owner Route] Withdraws the caller's application. Same check order as
/// `update_application`; the success body is a JSON string.
#[utoipa::path(
    delete,
    path = "/applications/{id}",
    params(("id" = String, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Deleted", body = String),
        (status = 401, description = "Not authenticated, or not the applicant", body = ErrorBody),
        (status = 403, description = "Invalid token", body = ErrorBody),
        (status = 404, description = "Application not found", body = ErrorBody)
    )
)]
pub async fn delete_application(
    State(state): State<AppState>,
    Path(id): Path<String>,
    auth: Result<AuthUser, ApiError>,
) -> ApiResult<Json<&'static str>> {
    let detail = find_application(&state, &id).await?;
    let user = auth?;
    ensure_applicant(&detail.application, &user)?;

    if !state.repo.delete_application(detail.application.id).await? {
        return Err(ApiError::not_found(APPLICATION_NOT_FOUND));
    }

    tracing::info!(application_id = %detail.application.id, "application deleted");
    Ok(Json(APPLICATION_DELETED))
}
