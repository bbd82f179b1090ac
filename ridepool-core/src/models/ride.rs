use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

pub const MAX_RIDE_SEATS: i32 = 8;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Pending,
    Available,
    Confirmed,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Pending => "pending",
            RideStatus::Available => "available",
            RideStatus::Confirmed => "confirmed",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    /// Rides accept bookings while available, and stay open once confirmed.
    pub fn is_bookable(&self) -> bool {
        matches!(self, RideStatus::Available | RideStatus::Confirmed)
    }

    /// Status a bookable ride takes once its seat counter lands on `remaining`.
    pub fn after_seat_change(remaining: i32) -> RideStatus {
        if remaining == 0 {
            RideStatus::Confirmed
        } else {
            RideStatus::Available
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RideStatus::Pending),
            "available" => Ok(RideStatus::Available),
            "confirmed" => Ok(RideStatus::Confirmed),
            "completed" => Ok(RideStatus::Completed),
            "cancelled" => Ok(RideStatus::Cancelled),
            other => Err(format!("unknown ride status '{}'", other)),
        }
    }
}

/// A published ride with a fixed seat capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ride {
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_location: String,
    pub to_location: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub total_seats: i32,
    pub available_seats: i32,
    pub price: f64,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
}

impl Ride {
    /// Publish a validated draft. New rides open with every seat free.
    pub fn publish(owner: Uuid, draft: NewRide) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner,
            from_location: draft.from_location.trim().to_string(),
            to_location: draft.to_location.trim().to_string(),
            departure_date: draft.departure_date,
            departure_time: draft.departure_time,
            total_seats: draft.total_seats,
            available_seats: draft.total_seats,
            price: draft.price,
            status: RideStatus::Available,
            created_at: Utc::now(),
        }
    }

    /// Take `seats` off the counter if the ride can hold them.
    /// Returns false and leaves the ride untouched otherwise.
    pub fn try_reserve(&mut self, seats: i32) -> bool {
        if seats < 1 || !self.status.is_bookable() || self.available_seats < seats {
            return false;
        }
        self.available_seats -= seats;
        self.status = RideStatus::after_seat_change(self.available_seats);
        true
    }

    /// Put `seats` back, capped at capacity. Only bookable rides change status.
    pub fn release(&mut self, seats: i32) {
        self.available_seats = (self.available_seats + seats).min(self.total_seats);
        if self.status.is_bookable() && self.available_seats > 0 {
            self.status = RideStatus::Available;
        }
    }
}

/// Driver-supplied fields for a new ride.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRide {
    pub from_location: String,
    pub to_location: String,
    pub departure_date: NaiveDate,
    pub departure_time: NaiveTime,
    pub total_seats: i32,
    pub price: f64,
}

impl NewRide {
    pub fn validate(&self, today: NaiveDate) -> CoreResult<()> {
        let from = self.from_location.trim();
        let to = self.to_location.trim();
        if from.is_empty() || to.is_empty() {
            return Err(CoreError::invalid("pickup and destination are required"));
        }
        if from.eq_ignore_ascii_case(to) {
            return Err(CoreError::invalid("pickup and destination must differ"));
        }
        if !(1..=MAX_RIDE_SEATS).contains(&self.total_seats) {
            return Err(CoreError::invalid(format!(
                "total_seats must be between 1 and {}",
                MAX_RIDE_SEATS
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(CoreError::invalid("price must be a non-negative amount"));
        }
        if self.departure_date < today {
            return Err(CoreError::invalid("departure date is in the past"));
        }
        Ok(())
    }
}

/// Search filters for the public ride listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RideFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub min_seats: Option<i32>,
}

impl RideFilter {
    /// In-memory counterpart of the listing query: available status, free seats,
    /// departure today or later, optional case-insensitive endpoints.
    pub fn matches(&self, ride: &Ride, today: NaiveDate) -> bool {
        let min_seats = self.min_seats.unwrap_or(1).max(1);
        let location_ok = |wanted: &Option<String>, actual: &str| match wanted {
            Some(w) if !w.trim().is_empty() => w.trim().eq_ignore_ascii_case(actual),
            _ => true,
        };

        ride.status == RideStatus::Available
            && ride.available_seats >= min_seats
            && ride.departure_date >= today
            && location_ok(&self.from, &ride.from_location)
            && location_ok(&self.to, &ride.to_location)
    }
}
