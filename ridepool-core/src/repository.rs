use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Booking, Profile, Ride, RideFilter, RideRequest};
use crate::StoreResult;

/// Repository trait for ride data access
#[async_trait]
pub trait RideRepository: Send + Sync {
    async fn get_ride(&self, id: Uuid) -> StoreResult<Option<Ride>>;

    /// Fetch several rides at once; unknown ids are skipped.
    async fn get_rides(&self, ids: &[Uuid]) -> StoreResult<Vec<Ride>>;

    /// All rides, ascending by departure.
    async fn list_rides(&self) -> StoreResult<Vec<Ride>>;

    /// Bookable rides departing on or after `today`, ascending by departure.
    async fn list_available_rides(
        &self,
        filter: &RideFilter,
        today: NaiveDate,
    ) -> StoreResult<Vec<Ride>>;

    async fn insert_ride(&self, ride: &Ride) -> StoreResult<()>;

    /// Returns false when no ride had that id.
    async fn delete_ride(&self, id: Uuid) -> StoreResult<bool>;

    /// Conditional decrement: takes `seats` off the ride only if it is bookable and
    /// has at least that many free, setting the status in the same write.
    /// `None` means the condition did not hold (or the ride is gone).
    async fn reserve_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>>;

    /// Inverse of `reserve_seats`, used to compensate a failed booking insert.
    async fn release_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>>;
}

/// Repository trait for booking data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;

    /// Newest first.
    async fn list_bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>>;
}

/// Repository trait for ride request data access
#[async_trait]
pub trait RideRequestRepository: Send + Sync {
    async fn insert_ride_request(&self, request: &RideRequest) -> StoreResult<()>;

    /// Newest first.
    async fn list_ride_requests_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RideRequest>>;
}

/// Repository trait for profile data access
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;

    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<()>;
}

/// The four tables behind one handle, whichever backend provides them.
#[derive(Clone)]
pub struct Repositories {
    pub rides: Arc<dyn RideRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub ride_requests: Arc<dyn RideRequestRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
}
