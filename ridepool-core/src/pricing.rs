use serde::Serialize;
use uuid::Uuid;

use crate::models::Ride;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Quote {
    pub ride_id: Uuid,
    pub seats: i32,
    pub price_per_seat: f64,
    pub service_fee: f64,
    pub total: f64,
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Price `seats` on `ride`: seat price times seats, plus a service fee charged as a
/// fraction of that subtotal.
pub fn quote(ride: &Ride, seats: i32, service_fee_rate: f64) -> CoreResult<Quote> {
    if seats < 1 {
        return Err(CoreError::invalid("seats must be at least 1"));
    }
    if !ride.status.is_bookable() {
        return Err(CoreError::RideUnavailable {
            status: ride.status,
        });
    }
    if seats > ride.available_seats {
        return Err(CoreError::InsufficientCapacity {
            requested: seats,
            remaining: ride.available_seats,
        });
    }

    let subtotal = ride.price * seats as f64;
    let service_fee = round_cents(subtotal * service_fee_rate.max(0.0));

    Ok(Quote {
        ride_id: ride.id,
        seats,
        price_per_seat: ride.price,
        service_fee,
        total: round_cents(subtotal + service_fee),
    })
}
