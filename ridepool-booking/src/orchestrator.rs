use ridepool_core::events::EventPublisher;
use ridepool_core::identity::Caller;
use ridepool_core::models::{Booking, BookingWithRide, Ride};
use ridepool_core::repository::{BookingRepository, Repositories, RideRepository};
use ridepool_core::{CoreError, CoreResult, StoreError};
use ridepool_shared::models::events::{BookingCreatedEvent, View, BOOKING_CREATED_TOPIC};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::locks::RideLocks;
use crate::{invalidate, ViewSender};

const RESERVE_ATTEMPTS: u32 = 3;

/// Inbound booking parameters, as sent by the rider app.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub ride_id: String,
    pub seats_booked: i32,
    pub total_amount: f64,
    pub payment_reference: Option<String>,
}

/// Coordinates the read-check-write sequence that turns a seat request into a booking.
///
/// Overselling is prevented twice: a per-ride lock serializes attempts inside this
/// process, and the store's conditional decrement (`reserve_seats`) refuses any
/// write that would take a ride below zero, which covers other processes sharing
/// the database.
///
/// Seats are reserved before the booking row is written. If the insert fails the
/// seats are released again, so a failed call never leaves the counter short.
/// There is no idempotency key: two identical requests produce two bookings.
pub struct BookingOrchestrator {
    rides: Arc<dyn RideRepository>,
    bookings: Arc<dyn BookingRepository>,
    publisher: Arc<dyn EventPublisher>,
    views: ViewSender,
    locks: RideLocks,
}

impl BookingOrchestrator {
    pub fn new(repos: &Repositories, publisher: Arc<dyn EventPublisher>, views: ViewSender) -> Self {
        Self {
            rides: repos.rides.clone(),
            bookings: repos.bookings.clone(),
            publisher,
            views,
            locks: RideLocks::new(),
        }
    }

    /// Book seats on a ride for `caller`.
    ///
    /// Checks run in a fixed order and stop at the first failure: identifier and
    /// amounts, authentication, ride existence, ride status, then capacity.
    pub async fn create_booking(&self, caller: Option<&Caller>, req: BookingRequest) -> CoreResult<Booking> {
        let ride_id = parse_ride_id(&req.ride_id)?;
        if req.seats_booked < 1 {
            return Err(CoreError::invalid("seats_booked must be at least 1"));
        }
        if !req.total_amount.is_finite() || req.total_amount < 0.0 {
            return Err(CoreError::invalid("total_amount must be a non-negative amount"));
        }
        let user_id = caller.ok_or(CoreError::Unauthenticated)?.user_id;
        let seats = req.seats_booked;

        let _guard = self.locks.acquire(ride_id).await;

        let ride = self
            .rides
            .get_ride(ride_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Ride", ride_id))?;
        check_bookable(&ride, seats)?;

        let updated = self.reserve(ride_id, seats).await?;

        let booking = Booking::confirmed(ride_id, user_id, seats, req.total_amount, req.payment_reference);

        if let Err(e) = self.bookings.insert_booking(&booking).await {
            error!("Booking insert failed for ride {}: {}. Releasing {} seat(s)", ride_id, e, seats);
            if let Err(undo) = self.rides.release_seats(ride_id, seats).await {
                error!(
                    "Compensation failed: ride {} is short {} seat(s) with no booking: {}",
                    ride_id, seats, undo
                );
            }
            return Err(e.into());
        }

        info!(
            "Booking {} confirmed: {} seat(s) on ride {}, {} left ({})",
            booking.id, seats, ride_id, updated.available_seats, updated.status
        );

        self.announce(&booking, &updated).await;
        Ok(booking)
    }

    /// A user's bookings, newest first, each with its ride joined in memory.
    /// Rides deleted since booking come back as `None`.
    pub async fn list_user_bookings(&self, user_id: Uuid) -> CoreResult<Vec<BookingWithRide>> {
        let mut bookings = self.bookings.list_bookings_for_user(user_id).await?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut seen = HashSet::new();
        let ride_ids: Vec<Uuid> = bookings
            .iter()
            .map(|b| b.ride_id)
            .filter(|id| seen.insert(*id))
            .collect();

        let rides: HashMap<Uuid, Ride> = self
            .rides
            .get_rides(&ride_ids)
            .await?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();

        Ok(bookings
            .into_iter()
            .map(|booking| {
                let ride = rides.get(&booking.ride_id).cloned();
                BookingWithRide { booking, ride }
            })
            .collect())
    }

    /// Conditional decrement. When it loses to another writer the ride is re-read:
    /// if the seats are really gone that is reported, otherwise the decrement is retried.
    async fn reserve(&self, ride_id: Uuid, seats: i32) -> CoreResult<Ride> {
        for attempt in 1..=RESERVE_ATTEMPTS {
            if let Some(updated) = self.rides.reserve_seats(ride_id, seats).await? {
                return Ok(updated);
            }
            warn!(
                "Seat reservation on ride {} lost a race (attempt {}), re-reading",
                ride_id, attempt
            );
            let current = self
                .rides
                .get_ride(ride_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Ride", ride_id))?;
            check_bookable(&current, seats)?;
        }
        Err(StoreError::Database(format!(
            "seat count on ride {} kept changing, gave up after {} attempts",
            ride_id, RESERVE_ATTEMPTS
        ))
        .into())
    }

    async fn announce(&self, booking: &Booking, ride: &Ride) {
        let event = BookingCreatedEvent {
            booking_id: booking.id,
            ride_id: ride.id,
            user_id: booking.user_id,
            seats_booked: booking.seats_booked,
            remaining_seats: ride.available_seats,
            ride_status: ride.status.to_string(),
            payment_status: booking.payment_status.to_string(),
            timestamp: booking.created_at.timestamp(),
        };
        match serde_json::to_string(&event) {
            Ok(payload) => {
                if let Err(e) = self
                    .publisher
                    .publish(BOOKING_CREATED_TOPIC, &booking.id.to_string(), &payload)
                    .await
                {
                    warn!("Booking {} saved but event not published: {}", booking.id, e);
                }
            }
            Err(e) => warn!("Could not serialize booking event: {}", e),
        }

        invalidate(
            &self.views,
            &[View::UserBookings, View::AvailableRides, View::Rides],
            Some(booking.user_id),
            Some(ride.id),
        );
    }
}

fn parse_ride_id(raw: &str) -> CoreResult<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| CoreError::invalid(format!("'{}' is not a valid ride id", raw)))
}

fn check_bookable(ride: &Ride, seats: i32) -> CoreResult<()> {
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
    Ok(())
}
