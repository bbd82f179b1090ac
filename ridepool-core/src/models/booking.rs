use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ride::Ride;

/// Bookings are confirmed on creation; there is no cancel path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(BookingStatus::Confirmed),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status '{}'", other)),
        }
    }
}

/// A reservation of one or more seats on a ride.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub user_id: Uuid,
    pub seats_booked: i32,
    pub total_amount: f64,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// A freshly confirmed booking. The payment widget's reference, when present,
    /// marks it paid; blank references count as absent.
    pub fn confirmed(
        ride_id: Uuid,
        user_id: Uuid,
        seats_booked: i32,
        total_amount: f64,
        payment_reference: Option<String>,
    ) -> Self {
        let payment_reference = payment_reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let payment_status = if payment_reference.is_some() {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Pending
        };

        Self {
            id: Uuid::new_v4(),
            ride_id,
            user_id,
            seats_booked,
            total_amount,
            booking_status: BookingStatus::Confirmed,
            payment_status,
            payment_reference,
            created_at: Utc::now(),
        }
    }
}

/// A booking with its ride joined in. `ride` is `None` when the ride was deleted
/// after booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingWithRide {
    #[serde(flatten)]
    pub booking: Booking,
    pub ride: Option<Ride>,
}
