use axum::{extract::State, routing::post, Json, Router};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use ridepool_core::identity::{Caller, Role};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::AppJson,
    middleware::auth::Claims,
    state::{AppState, AuthConfig},
};

#[derive(Debug, Deserialize)]
struct DevTokenRequest {
    user_id: Option<Uuid>,
    role: Option<Role>,
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user_id: Uuid,
    role: Role,
    expires_at: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/auth/token", post(issue_dev_token))
}

/// Sign a token for `caller`. Returns the token and its expiry as a unix timestamp.
pub fn issue_token(auth: &AuthConfig, caller: &Caller) -> Result<(String, i64), AppError> {
    let expires_at = (Utc::now() + Duration::seconds(auth.expiration as i64)).timestamp();
    let claims = Claims {
        sub: caller.user_id.to_string(),
        role: caller.role.as_str().to_owned(),
        exp: expires_at as usize,
    };

    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))?;

    Ok((token, expires_at))
}

// Identity comes from an external provider in production; this only exists
// for local development and is off unless `auth.allow_dev_tokens` is set.
async fn issue_dev_token(
    State(state): State<AppState>,
    AppJson(req): AppJson<DevTokenRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    if !state.auth.allow_dev_tokens {
        return Err(AppError::NotFoundError("Not found".to_string()));
    }

    let caller = Caller {
        user_id: req.user_id.unwrap_or_else(Uuid::new_v4),
        role: req.role.unwrap_or(Role::Rider),
    };
    let (token, expires_at) = issue_token(&state.auth, &caller)?;
    info!("Issued dev token for {} ({})", caller.user_id, caller.role);

    Ok(Json(AuthResponse {
        token,
        user_id: caller.user_id,
        role: caller.role,
        expires_at,
    }))
}
