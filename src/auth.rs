use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AppConfig, error::ApiError};

pub const AUTHENTICATION_REQUIRED: &str = "User has to be authenticated to make this request";
pub const INVALID_TOKEN: &str = "Invalid token";

/// Claims
///
/// Payload of the bearer tokens issued to users: `{ "userId": ..., "email": ... }`.
/// Tokens are signed with HS256 using the shared `SECRETSAUCE` secret. No registered claim
/// is mandatory; an `exp`, when present, is still enforced by the decoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub email: String,
}

/// AuthUser
///
/// The resolved identity of an authenticated request, decoded from the bearer token.
/// Inserted into the request extensions by the auth middleware and usable directly as a
/// handler argument.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

/// Signs a token for the given identity. Used by tooling and tests; the API itself only
/// verifies tokens.
pub fn issue_token(user_id: Uuid, email: &str, secret: &str) -> Result<String, ApiError> {
    let claims = Claims {
        user_id: user_id.to_string(),
        email: email.to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("failed to sign token: {e}")))
}

/// authenticate
///
/// Resolves the caller from the `Authorization` header.
///
/// - No header, an empty one, or a bare `Bearer` scheme -> 401 `AUTHENTICATION_REQUIRED`.
/// - Any other scheme, a bare credential, or a token that fails decoding (bad signature,
///   malformed, expired, non-UUID `userId`) -> 403 `INVALID_TOKEN`.
///
/// The scheme name is matched case-insensitively.
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthUser, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(ApiError::unauthorized(AUTHENTICATION_REQUIRED));
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::forbidden(INVALID_TOKEN))?
        .trim();

    let token = bearer_token(raw)?;

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    // Issued tokens carry only userId/email.
    validation.required_spec_claims.clear();
    validation.validate_exp = true;

    let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!("token rejected: {:?}", e.kind());
        ApiError::forbidden(INVALID_TOKEN)
    })?;

    let id = Uuid::parse_str(&token_data.claims.user_id).map_err(|_| {
        tracing::debug!("token rejected: userId is not a UUID");
        ApiError::forbidden(INVALID_TOKEN)
    })?;

    Ok(AuthUser {
        id,
        email: token_data.claims.email,
    })
}

/// Splits `<scheme> <token>` and keeps the token of a `Bearer` credential.
fn bearer_token(raw: &str) -> Result<&str, ApiError> {
    let (scheme, token) = raw
        .split_once(char::is_whitespace)
        .map(|(scheme, token)| (scheme, token.trim()))
        .unwrap_or((raw, ""));

    if token.is_empty() {
        return if scheme.is_empty() || scheme.eq_ignore_ascii_case("bearer") {
            Err(ApiError::unauthorized(AUTHENTICATION_REQUIRED))
        } else {
            tracing::debug!("token rejected: credential without a scheme");
            Err(ApiError::forbidden(INVALID_TOKEN))
        };
    }

    if !scheme.eq_ignore_ascii_case("bearer") {
        tracing::debug!("token rejected: unsupported scheme {scheme:?}");
        return Err(ApiError::forbidden(INVALID_TOKEN));
    }
    Ok(token)
}

/// AuthUser Extractor Implementation
///
/// Reuses the identity already attached by the auth middleware when present, otherwise
/// validates the bearer token itself. Handlers that must check something before
/// authentication take `Result<AuthUser, ApiError>` instead.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);
        authenticate(&parts.headers, &config.jwt_secret)
    }
}
