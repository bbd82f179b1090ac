use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, DecodingKey, Validation};
use ridepool_core::identity::{Caller, Role};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

/// `Ok(None)` when no bearer token was sent; a token that is present but
/// invalid is always an error.
fn bearer_caller(headers: &HeaderMap, auth: &AuthConfig) -> Result<Option<Caller>, AppError> {
    let Some(header) = headers.typed_get::<Authorization<Bearer>>() else {
        return Ok(None);
    };

    let token_data = decode::<Claims>(
        header.token(),
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        AppError::AuthenticationError("Invalid or expired token".to_string())
    })?;

    let user_id = Uuid::parse_str(&token_data.claims.sub)
        .map_err(|_| AppError::AuthenticationError("Token subject is not a user id".to_string()))?;
    let role = token_data
        .claims
        .role
        .parse::<Role>()
        .map_err(AppError::AuthenticationError)?;

    Ok(Some(Caller { user_id, role }))
}

// ============================================================================
// Extractors
// ============================================================================

/// A signed-in caller; rejects with 401 when the token is missing.
pub struct RiderAuth(pub Caller);

impl FromRequestParts<AppState> for RiderAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_caller(&parts.headers, &state.auth)?
            .map(RiderAuth)
            .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))
    }
}

/// The caller if a valid token was sent. A missing, invalid or expired token
/// all yield `None`; the operation decides whether anonymous access is allowed
/// and in what order that is checked.
pub struct OptionalAuth(pub Option<Caller>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = bearer_caller(&parts.headers, &state.auth).unwrap_or_else(|e| {
            debug!("Treating request as anonymous: {:?}", e);
            None
        });
        Ok(OptionalAuth(caller))
    }
}

// ============================================================================
// Admin Authentication Middleware
// ============================================================================

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = bearer_caller(req.headers(), &state.auth)?
        .ok_or_else(|| AppError::AuthenticationError("Missing bearer token".to_string()))?;

    if !caller.is_admin() {
        return Err(AppError::AuthorizationError("Admin role required".to_string()));
    }

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}
