use async_trait::async_trait;
use chrono::NaiveDate;
use ridepool_core::models::{Booking, Profile, Ride, RideFilter, RideRequest};
use ridepool_core::repository::{
    BookingRepository, ProfileRepository, Repositories, RideRepository, RideRequestRepository,
};
use ridepool_core::{StoreError, StoreResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    rides: HashMap<Uuid, Ride>,
    bookings: Vec<Booking>,
    ride_requests: Vec<RideRequest>,
    profiles: HashMap<Uuid, Profile>,
}

/// Process-local store for tests and database-less dev runs.
///
/// Every operation takes one lock over all tables, so `reserve_seats` is atomic the
/// same way the conditional `UPDATE` is in Postgres. The `fail_*` switches make
/// the next calls return `StoreError::Database` to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_ride_reads: AtomicBool,
    fail_ride_writes: AtomicBool,
    fail_booking_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            rides: self.clone(),
            bookings: self.clone(),
            ride_requests: self.clone(),
            profiles: self.clone(),
        }
    }

    pub fn fail_ride_reads(&self, fail: bool) {
        self.fail_ride_reads.store(fail, Ordering::SeqCst);
    }

    /// Covers seat reservation and release as well as ride insert/delete.
    pub fn fail_ride_writes(&self, fail: bool) {
        self.fail_ride_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_booking_inserts(&self, fail: bool) {
        self.fail_booking_inserts.store(fail, Ordering::SeqCst);
    }

    /// Every stored booking, oldest first.
    pub fn all_bookings(&self) -> Vec<Booking> {
        self.lock().map(|t| t.bookings.clone()).unwrap_or_default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Database("memory store lock poisoned".into()))
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Database(format!("simulated failure: {}", what)));
        }
        Ok(())
    }
}

fn by_departure(a: &Ride, b: &Ride) -> std::cmp::Ordering {
    (a.departure_date, a.departure_time).cmp(&(b.departure_date, b.departure_time))
}

#[async_trait]
impl RideRepository for MemoryStore {
    async fn get_ride(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        Self::check(&self.fail_ride_reads, "get_ride")?;
        Ok(self.lock()?.rides.get(&id).cloned())
    }

    async fn get_rides(&self, ids: &[Uuid]) -> StoreResult<Vec<Ride>> {
        Self::check(&self.fail_ride_reads, "get_rides")?;
        let tables = self.lock()?;
        Ok(ids.iter().filter_map(|id| tables.rides.get(id).cloned()).collect())
    }

    async fn list_rides(&self) -> StoreResult<Vec<Ride>> {
        Self::check(&self.fail_ride_reads, "list_rides")?;
        let mut rides: Vec<Ride> = self.lock()?.rides.values().cloned().collect();
        rides.sort_by(by_departure);
        Ok(rides)
    }

    async fn list_available_rides(
        &self,
        filter: &RideFilter,
        today: NaiveDate,
    ) -> StoreResult<Vec<Ride>> {
        Self::check(&self.fail_ride_reads, "list_available_rides")?;
        let mut rides: Vec<Ride> = self
            .lock()?
            .rides
            .values()
            .filter(|r| filter.matches(r, today))
            .cloned()
            .collect();
        rides.sort_by(by_departure);
        Ok(rides)
    }

    async fn insert_ride(&self, ride: &Ride) -> StoreResult<()> {
        Self::check(&self.fail_ride_writes, "insert_ride")?;
        let mut tables = self.lock()?;
        if tables.rides.contains_key(&ride.id) {
            return Err(StoreError::Database(format!("duplicate ride id {}", ride.id)));
        }
        tables.rides.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn delete_ride(&self, id: Uuid) -> StoreResult<bool> {
        Self::check(&self.fail_ride_writes, "delete_ride")?;
        Ok(self.lock()?.rides.remove(&id).is_some())
    }

    async fn reserve_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>> {
        Self::check(&self.fail_ride_writes, "reserve_seats")?;
        let mut tables = self.lock()?;
        let Some(ride) = tables.rides.get_mut(&id) else {
            return Ok(None);
        };
        if ride.try_reserve(seats) {
            Ok(Some(ride.clone()))
        } else {
            Ok(None)
        }
    }

    async fn release_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>> {
        Self::check(&self.fail_ride_writes, "release_seats")?;
        let mut tables = self.lock()?;
        Ok(tables.rides.get_mut(&id).map(|ride| {
            ride.release(seats);
            ride.clone()
        }))
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        Self::check(&self.fail_booking_inserts, "insert_booking")?;
        self.lock()?.bookings.push(booking.clone());
        Ok(())
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .lock()?
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        // Newest first; ties keep the latest insert first.
        bookings.reverse();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}

#[async_trait]
impl RideRequestRepository for MemoryStore {
    async fn insert_ride_request(&self, request: &RideRequest) -> StoreResult<()> {
        self.lock()?.ride_requests.push(request.clone());
        Ok(())
    }

    async fn list_ride_requests_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RideRequest>> {
        let mut requests: Vec<RideRequest> = self
            .lock()?
            .ride_requests
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        requests.reverse();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.lock()?.profiles.get(&user_id).cloned())
    }

    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<()> {
        self.lock()?.profiles.insert(profile.id, profile.clone());
        Ok(())
    }
}
