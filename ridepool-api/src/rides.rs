use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use ridepool_core::models::{NewRide, Ride, RideFilter};
use ridepool_core::pricing::Quote;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    middleware::auth::RiderAuth,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rides", get(list_rides).post(create_ride))
        .route("/v1/rides/{id}", get(get_ride))
        .route("/v1/rides/{id}/quote", get(quote_ride))
}

/// Open rides departing today or later, soonest first.
async fn list_rides(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<RideFilter>,
) -> Result<Json<Vec<Ride>>, AppError> {
    Ok(Json(state.catalog.list_available(&filter).await?))
}

async fn get_ride(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Ride>, AppError> {
    Ok(Json(state.catalog.get(id).await?))
}

async fn create_ride(
    State(state): State<AppState>,
    RiderAuth(caller): RiderAuth,
    AppJson(draft): AppJson<NewRide>,
) -> Result<(StatusCode, Json<Ride>), AppError> {
    let ride = state.catalog.publish(&caller, draft).await?;
    Ok((StatusCode::CREATED, Json(ride)))
}

#[derive(Debug, Deserialize)]
struct QuoteParams {
    seats: i32,
}

async fn quote_ride(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(params): AppQuery<QuoteParams>,
) -> Result<Json<Quote>, AppError> {
    Ok(Json(state.catalog.quote(id, params.seats).await?))
}
