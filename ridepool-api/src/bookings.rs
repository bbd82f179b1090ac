use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use ridepool_booking::{BookingRequest, ProfileService};
use ridepool_core::models::{Booking, BookingWithRide};
use ridepool_core::notify::{EmailMessage, Notifier};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    error::AppError,
    extract::AppJson,
    middleware::auth::{OptionalAuth, RiderAuth},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings", post(create_booking).get(list_bookings))
}

// Authentication is checked by the orchestrator, after the request itself
// has been validated, so a missing or stale token is not rejected here.
async fn create_booking(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
    AppJson(req): AppJson<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.orchestrator.create_booking(caller.as_ref(), req).await?;

    if state.rules.send_confirmation_email {
        tokio::spawn(send_confirmation(
            state.profiles.clone(),
            state.notifier.clone(),
            booking.clone(),
        ));
    }

    Ok((StatusCode::CREATED, Json(booking)))
}

async fn list_bookings(
    State(state): State<AppState>,
    RiderAuth(caller): RiderAuth,
) -> Result<Json<Vec<BookingWithRide>>, AppError> {
    Ok(Json(state.orchestrator.list_user_bookings(caller.user_id).await?))
}

async fn send_confirmation(profiles: Arc<ProfileService>, notifier: Arc<dyn Notifier>, booking: Booking) {
    let profile = match profiles.find(booking.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            debug!("No profile for {}, skipping confirmation for booking {}", booking.user_id, booking.id);
            return;
        }
        Err(e) => {
            warn!("Profile lookup failed for booking {} confirmation: {}", booking.id, e);
            return;
        }
    };

    let message = EmailMessage::plain(
        profile.email,
        format!("Booking confirmed: {} seat(s)", booking.seats_booked),
        format!(
            "Hi {},\n\nYour booking {} for {} seat(s) is confirmed.\nTotal: {:.2}\nPayment: {}\n",
            profile.full_name, booking.id, booking.seats_booked, booking.total_amount, booking.payment_status
        ),
    );

    if let Err(e) = notifier.send(&message).await {
        warn!("Confirmation email for booking {} not sent: {}", booking.id, e);
    }
}
