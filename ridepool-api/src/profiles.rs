use axum::{extract::State, routing::get, Json, Router};
use ridepool_core::models::{Profile, ProfileUpdate};

use crate::{error::AppError, extract::AppJson, middleware::auth::RiderAuth, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/profile", get(get_profile).put(update_profile))
}

async fn get_profile(State(state): State<AppState>, RiderAuth(caller): RiderAuth) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.profiles.get(caller.user_id).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    RiderAuth(caller): RiderAuth,
    AppJson(update): AppJson<ProfileUpdate>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.profiles.update(&caller, update).await?))
}
