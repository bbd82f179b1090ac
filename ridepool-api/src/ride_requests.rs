use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use ridepool_core::models::{NewRideRequest, RideRequest};

use crate::{error::AppError, extract::AppJson, middleware::auth::RiderAuth, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/ride-requests", post(create_request).get(list_requests))
}

async fn create_request(
    State(state): State<AppState>,
    RiderAuth(caller): RiderAuth,
    AppJson(draft): AppJson<NewRideRequest>,
) -> Result<(StatusCode, Json<RideRequest>), AppError> {
    let request = state.ride_requests.create(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

async fn list_requests(
    State(state): State<AppState>,
    RiderAuth(caller): RiderAuth,
) -> Result<Json<Vec<RideRequest>>, AppError> {
    Ok(Json(state.ride_requests.list_for_user(caller.user_id).await?))
}
