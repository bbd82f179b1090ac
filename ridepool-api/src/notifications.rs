use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use ridepool_core::notify::EmailMessage;
use ridepool_shared::Masked;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{error::AppError, extract::AppJson, middleware::auth::RiderAuth, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/notifications/email", post(send_email))
}

/// Validates and queues the message. Delivery happens in the background and
/// its outcome is only logged.
async fn send_email(
    State(state): State<AppState>,
    RiderAuth(caller): RiderAuth,
    AppJson(message): AppJson<EmailMessage>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    message.validate()?;
    info!(
        "Email to {} requested by {}",
        Masked(message.to.as_str()),
        caller.user_id
    );

    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.send(&message).await {
            warn!("Email to {} failed: {}", Masked(message.to.as_str()), e);
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "queued" }))))
}
