use axum::{
    extract::State,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{delete, get},
    Extension, Json, Router,
};
use ridepool_core::identity::Caller;
use ridepool_core::models::Ride;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AppError,
    extract::AppPath,
    middleware::auth::admin_auth_middleware,
    state::AppState,
};

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/rides", get(list_all_rides))
        .route("/v1/admin/rides/{id}", delete(delete_ride))
        .route_layer(from_fn_with_state(state, admin_auth_middleware))
}

async fn list_all_rides(State(state): State<AppState>) -> Result<Json<Vec<Ride>>, AppError> {
    Ok(Json(state.catalog.list_all().await?))
}

async fn delete_ride(
    State(state): State<AppState>,
    Extension(admin): Extension<Caller>,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete(id).await?;
    info!("Ride {} removed by admin {}", id, admin.user_id);
    Ok(StatusCode::NO_CONTENT)
}
