use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kafka topic for confirmed bookings.
pub const BOOKING_CREATED_TOPIC: &str = "booking.created";

/// Kafka topic consumed by the mailer.
pub const EMAIL_REQUESTED_TOPIC: &str = "notifications.email";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BookingCreatedEvent {
    pub booking_id: Uuid,
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub seats_booked: i32,
    pub remaining_seats: i32,
    pub ride_status: String,
    pub payment_status: String,
    pub timestamp: i64,
}

/// Derived read models that clients cache and must refetch after a mutation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum View {
    UserBookings,
    AvailableRides,
    Rides,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ViewInvalidatedEvent {
    pub view: View,
    /// Set for per-user views.
    pub user_id: Option<Uuid>,
    pub ride_id: Option<Uuid>,
    pub timestamp: i64,
}

impl ViewInvalidatedEvent {
    pub fn new(view: View, user_id: Option<Uuid>, ride_id: Option<Uuid>) -> Self {
        Self {
            view,
            user_id,
            ride_id,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// Whether a subscriber identified by `user_id` should see this event.
    pub fn visible_to(&self, user_id: Option<Uuid>) -> bool {
        match self.user_id {
            None => true,
            Some(owner) => Some(owner) == user_id,
        }
    }
}
