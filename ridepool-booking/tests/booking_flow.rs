use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use futures_util::future::join_all;
use ridepool_booking::{BookingOrchestrator, BookingRequest, RideCatalog};
use ridepool_core::events::{EventPublisher, NullPublisher};
use ridepool_core::identity::Caller;
use ridepool_core::models::{NewRide, PaymentStatus, Ride, RideFilter, RideStatus};
use ridepool_core::repository::{Repositories, RideRepository};
use ridepool_core::{CoreError, StoreError, StoreResult};
use ridepool_shared::models::events::{View, BOOKING_CREATED_TOPIC};
use ridepool_store::MemoryStore;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use uuid::Uuid;

struct Harness {
    store: Arc<MemoryStore>,
    orchestrator: Arc<BookingOrchestrator>,
    views: broadcast::Sender<ridepool_shared::models::events::ViewInvalidatedEvent>,
}

fn harness_with(publisher: Arc<dyn EventPublisher>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let (views, _) = broadcast::channel(64);
    let orchestrator = Arc::new(BookingOrchestrator::new(&store.repositories(), publisher, views.clone()));
    Harness {
        store,
        orchestrator,
        views,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(NullPublisher))
}

async fn seed_ride(store: &MemoryStore, total: i32, available: i32, status: RideStatus) -> Ride {
    let mut ride = Ride::publish(
        Uuid::new_v4(),
        NewRide {
            from_location: "Bristol".into(),
            to_location: "Bath".into(),
            departure_date: (Utc::now() + Duration::days(3)).date_naive(),
            departure_time: NaiveTime::from_hms_opt(8, 15, 0).unwrap(),
            total_seats: total,
            price: 6.5,
        },
    );
    ride.available_seats = available;
    ride.status = status;
    store.insert_ride(&ride).await.unwrap();
    ride
}

fn request(ride_id: impl ToString, seats: i32) -> BookingRequest {
    BookingRequest {
        ride_id: ride_id.to_string(),
        seats_booked: seats,
        total_amount: 6.5 * seats as f64,
        payment_reference: None,
    }
}

async fn ride_now(store: &MemoryStore, id: Uuid) -> Ride {
    store.get_ride(id).await.unwrap().unwrap()
}

#[tokio::test]
async fn test_booking_last_seats_confirms_ride() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 3, 3, RideStatus::Available).await;

    let booking = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 3))
        .await
        .unwrap();

    assert_eq!(booking.seats_booked, 3);
    assert_eq!(booking.user_id, rider.user_id);
    let after = ride_now(&h.store, ride.id).await;
    assert_eq!(after.available_seats, 0);
    assert_eq!(after.status, RideStatus::Confirmed);
}

#[tokio::test]
async fn test_partial_booking_stays_available() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 4, 4, RideStatus::Available).await;

    h.orchestrator
        .create_booking(Some(&rider), request(ride.id, 1))
        .await
        .unwrap();

    let after = ride_now(&h.store, ride.id).await;
    assert_eq!(after.available_seats, 3);
    assert_eq!(after.status, RideStatus::Available);
}

#[tokio::test]
async fn test_overbooking_leaves_ride_unchanged() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 4, 2, RideStatus::Available).await;

    let err = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 3))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("Only 2 seat(s) left"));
    match err {
        CoreError::InsufficientCapacity { requested, remaining } => {
            assert_eq!(requested, 3);
            assert_eq!(remaining, 2);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(ride_now(&h.store, ride.id).await, ride);
    assert!(h.store.all_bookings().is_empty());
}

#[tokio::test]
async fn test_full_ride_rejects_any_seat_count() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 3, 0, RideStatus::Confirmed).await;

    for seats in 1..=4 {
        let err = h
            .orchestrator
            .create_booking(Some(&rider), request(ride.id, seats))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCapacity { remaining: 0, .. }));
    }
    assert_eq!(ride_now(&h.store, ride.id).await.available_seats, 0);
}

#[tokio::test]
async fn test_cancelled_ride_is_unavailable_before_seat_check() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 3, 0, RideStatus::Cancelled).await;

    let err = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 5))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::RideUnavailable {
            status: RideStatus::Cancelled
        }
    ));
}

#[tokio::test]
async fn test_pending_and_completed_rides_are_unavailable() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    for status in [RideStatus::Pending, RideStatus::Completed] {
        let ride = seed_ride(&h.store, 3, 3, status).await;
        let err = h
            .orchestrator
            .create_booking(Some(&rider), request(ride.id, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::RideUnavailable { .. }));
    }
}

#[tokio::test]
async fn test_placeholder_id_fails_without_store_access() {
    let h = harness();
    h.store.fail_ride_reads(true);

    let err = h
        .orchestrator
        .create_booking(None, request("temp-ride-id", 1))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::InvalidInput(_)));
}

#[tokio::test]
async fn test_bad_amounts_are_invalid_input() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 3, 3, RideStatus::Available).await;

    let mut zero_seats = request(ride.id, 1);
    zero_seats.seats_booked = 0;
    assert!(matches!(
        h.orchestrator.create_booking(Some(&rider), zero_seats).await,
        Err(CoreError::InvalidInput(_))
    ));

    let mut negative = request(ride.id, 1);
    negative.total_amount = -4.0;
    assert!(matches!(
        h.orchestrator.create_booking(Some(&rider), negative).await,
        Err(CoreError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_anonymous_caller_is_rejected_before_lookup() {
    let h = harness();
    h.store.fail_ride_reads(true);

    let err = h
        .orchestrator
        .create_booking(None, request(Uuid::new_v4(), 1))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Unauthenticated));
}

#[tokio::test]
async fn test_unknown_ride_is_not_found() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());

    let err = h
        .orchestrator
        .create_booking(Some(&rider), request(Uuid::new_v4(), 1))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NotFound { entity: "Ride", .. }));
}

#[tokio::test]
async fn test_read_failure_aborts_without_decrement() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 3, 3, RideStatus::Available).await;

    h.store.fail_ride_reads(true);
    let err = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 1))
        .await
        .unwrap_err();
    h.store.fail_ride_reads(false);

    assert!(matches!(err, CoreError::StorageError(_)));
    assert_eq!(ride_now(&h.store, ride.id).await.available_seats, 3);
}

#[tokio::test]
async fn test_failed_insert_releases_seats() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 2, 2, RideStatus::Available).await;

    h.store.fail_booking_inserts(true);
    let err = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 2))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::StorageError(_)));
    let after = ride_now(&h.store, ride.id).await;
    assert_eq!(after.available_seats, 2);
    assert_eq!(after.status, RideStatus::Available);
    assert!(h.store.all_bookings().is_empty());
}

#[tokio::test]
async fn test_reserve_failure_persists_nothing() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 3, 3, RideStatus::Available).await;

    h.store.fail_ride_writes(true);
    let err = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 1))
        .await
        .unwrap_err();
    h.store.fail_ride_writes(false);

    assert!(matches!(err, CoreError::StorageError(_)));
    assert_eq!(ride_now(&h.store, ride.id).await, ride);
    assert!(h.store.all_bookings().is_empty());
}

/// Delegates to the memory store, with scripted misbehaviour on seat writes.
struct ScriptedRides {
    inner: Arc<MemoryStore>,
    /// Reservations that report a lost race without touching the counter.
    lose_next: AtomicU32,
    /// Seats a competing writer takes right before our next reservation.
    steal_next: AtomicI32,
    fail_release: AtomicBool,
}

impl ScriptedRides {
    fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            lose_next: AtomicU32::new(0),
            steal_next: AtomicI32::new(0),
            fail_release: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl RideRepository for ScriptedRides {
    async fn get_ride(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        self.inner.get_ride(id).await
    }

    async fn get_rides(&self, ids: &[Uuid]) -> StoreResult<Vec<Ride>> {
        self.inner.get_rides(ids).await
    }

    async fn list_rides(&self) -> StoreResult<Vec<Ride>> {
        self.inner.list_rides().await
    }

    async fn list_available_rides(&self, filter: &RideFilter, today: NaiveDate) -> StoreResult<Vec<Ride>> {
        self.inner.list_available_rides(filter, today).await
    }

    async fn insert_ride(&self, ride: &Ride) -> StoreResult<()> {
        self.inner.insert_ride(ride).await
    }

    async fn delete_ride(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_ride(id).await
    }

    async fn reserve_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>> {
        let stolen = self.steal_next.swap(0, Ordering::SeqCst);
        if stolen > 0 {
            self.inner.reserve_seats(id, stolen).await?;
            return Ok(None);
        }
        if self
            .lose_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(None);
        }
        self.inner.reserve_seats(id, seats).await
    }

    async fn release_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(StoreError::Database("release refused".into()));
        }
        self.inner.release_seats(id, seats).await
    }
}

fn scripted_orchestrator(store: &Arc<MemoryStore>, rides: Arc<ScriptedRides>) -> BookingOrchestrator {
    let repos = Repositories {
        rides,
        ..store.repositories()
    };
    let (views, _) = broadcast::channel(16);
    BookingOrchestrator::new(&repos, Arc::new(NullPublisher), views)
}

#[tokio::test]
async fn test_failed_compensation_still_reports_storage_error() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 4, 4, RideStatus::Available).await;
    let rides = Arc::new(ScriptedRides::new(h.store.clone()));
    rides.fail_release.store(true, Ordering::SeqCst);
    let orchestrator = scripted_orchestrator(&h.store, rides);

    h.store.fail_booking_inserts(true);
    let err = orchestrator
        .create_booking(Some(&rider), request(ride.id, 3))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::StorageError(_)));
    assert!(h.store.all_bookings().is_empty());
    // The release was refused, so the reserved seats stay taken with no booking.
    assert_eq!(ride_now(&h.store, ride.id).await.available_seats, 1);
}

#[tokio::test]
async fn test_lost_race_with_seats_restored_is_retried() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 4, 4, RideStatus::Available).await;
    let rides = Arc::new(ScriptedRides::new(h.store.clone()));
    rides.lose_next.store(1, Ordering::SeqCst);
    let orchestrator = scripted_orchestrator(&h.store, rides);

    let booking = orchestrator
        .create_booking(Some(&rider), request(ride.id, 2))
        .await
        .unwrap();

    assert_eq!(booking.seats_booked, 2);
    assert_eq!(ride_now(&h.store, ride.id).await.available_seats, 2);
    assert_eq!(h.store.all_bookings().len(), 1);
}

#[tokio::test]
async fn test_lost_race_reports_what_is_really_left() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 4, 4, RideStatus::Available).await;
    let rides = Arc::new(ScriptedRides::new(h.store.clone()));
    rides.steal_next.store(3, Ordering::SeqCst);
    let orchestrator = scripted_orchestrator(&h.store, rides);

    let err = orchestrator
        .create_booking(Some(&rider), request(ride.id, 2))
        .await
        .unwrap_err();

    match err {
        CoreError::InsufficientCapacity { requested, remaining } => {
            assert_eq!(requested, 2);
            assert_eq!(remaining, 1);
        }
        other => panic!("expected InsufficientCapacity, got {:?}", other),
    }
    assert!(h.store.all_bookings().is_empty());
}

#[tokio::test]
async fn test_endless_lost_races_give_up_without_writing() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 4, 4, RideStatus::Available).await;
    let rides = Arc::new(ScriptedRides::new(h.store.clone()));
    rides.lose_next.store(u32::MAX, Ordering::SeqCst);
    let orchestrator = scripted_orchestrator(&h.store, rides);

    let err = orchestrator
        .create_booking(Some(&rider), request(ride.id, 1))
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::StorageError(_)));
    assert_eq!(ride_now(&h.store, ride.id).await, ride);
    assert!(h.store.all_bookings().is_empty());
}

#[tokio::test]
async fn test_payment_reference_marks_booking_paid() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 3, 3, RideStatus::Available).await;

    let mut paid = request(ride.id, 1);
    paid.payment_reference = Some("T_4821_pay".into());
    let booking = h.orchestrator.create_booking(Some(&rider), paid).await.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(booking.payment_reference.as_deref(), Some("T_4821_pay"));

    let unpaid = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 1))
        .await
        .unwrap();
    assert_eq!(unpaid.payment_status, PaymentStatus::Pending);
}

/// No idempotency key exists, so a repeated request is a second booking.
#[tokio::test]
async fn test_repeated_request_books_twice() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 4, 4, RideStatus::Available).await;

    let first = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 2))
        .await
        .unwrap();
    let second = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 2))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(h.store.all_bookings().len(), 2);
    let after = ride_now(&h.store, ride.id).await;
    assert_eq!(after.available_seats, 0);
    assert_eq!(after.status, RideStatus::Confirmed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_bookings_never_oversell() {
    let h = harness();
    let ride = seed_ride(&h.store, 3, 3, RideStatus::Available).await;
    let ride_id = ride.id;

    let attempts = (0..10).map(|_| {
        let orchestrator = h.orchestrator.clone();
        let rider = Caller::rider(Uuid::new_v4());
        tokio::spawn(async move { orchestrator.create_booking(Some(&rider), request(ride_id, 1)).await })
    });
    let results: Vec<_> = join_all(attempts).await.into_iter().map(|r| r.unwrap()).collect();

    let booked = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(booked, 3);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, CoreError::InsufficientCapacity { remaining: 0, .. })));

    let after = ride_now(&h.store, ride.id).await;
    assert_eq!(after.available_seats, 0);
    assert_eq!(after.status, RideStatus::Confirmed);
}

/// Two orchestrators over one store stand in for two API replicas; only the
/// store's conditional decrement protects the counter here.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_separate_orchestrators_share_capacity() {
    let store = Arc::new(MemoryStore::new());
    let (views, _) = broadcast::channel(64);
    let replicas: Vec<Arc<BookingOrchestrator>> = (0..2)
        .map(|_| {
            Arc::new(BookingOrchestrator::new(
                &store.repositories(),
                Arc::new(NullPublisher),
                views.clone(),
            ))
        })
        .collect();
    let ride = seed_ride(&store, 5, 5, RideStatus::Available).await;
    let ride_id = ride.id;

    let attempts = (0..12).map(|i| {
        let orchestrator = replicas[i % 2].clone();
        let rider = Caller::rider(Uuid::new_v4());
        tokio::spawn(async move { orchestrator.create_booking(Some(&rider), request(ride_id, 1)).await })
    });
    let booked = join_all(attempts)
        .await
        .into_iter()
        .filter(|r| matches!(r, Ok(Ok(_))))
        .count();

    assert_eq!(booked, 5);
    assert_eq!(store.all_bookings().len(), 5);
    assert_eq!(ride_now(&store, ride.id).await.available_seats, 0);
}

#[tokio::test]
async fn test_listing_is_newest_first_and_tolerates_deleted_rides() {
    let h = harness();
    let rider = Caller::rider(Uuid::new_v4());
    let kept = seed_ride(&h.store, 4, 4, RideStatus::Available).await;
    let doomed = seed_ride(&h.store, 4, 4, RideStatus::Available).await;

    let older = h
        .orchestrator
        .create_booking(Some(&rider), request(kept.id, 1))
        .await
        .unwrap();
    let newer = h
        .orchestrator
        .create_booking(Some(&rider), request(doomed.id, 2))
        .await
        .unwrap();
    h.store.delete_ride(doomed.id).await.unwrap();

    // Someone else's booking must not leak into the list.
    h.orchestrator
        .create_booking(Some(&Caller::rider(Uuid::new_v4())), request(kept.id, 1))
        .await
        .unwrap();

    let listed = h.orchestrator.list_user_bookings(rider.user_id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].booking.id, newer.id);
    assert!(listed[0].ride.is_none());
    assert_eq!(listed[1].booking.id, older.id);
    assert_eq!(listed[1].ride.as_ref().map(|r| r.id), Some(kept.id));
}

#[tokio::test]
async fn test_success_invalidates_three_views() {
    let h = harness();
    let mut rx = h.views.subscribe();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 2, 2, RideStatus::Available).await;

    h.orchestrator
        .create_booking(Some(&rider), request(ride.id, 1))
        .await
        .unwrap();

    let mut seen = Vec::new();
    for _ in 0..3 {
        seen.push(rx.recv().await.unwrap());
    }
    let views: Vec<View> = seen.iter().map(|e| e.view).collect();
    assert_eq!(views, vec![View::UserBookings, View::AvailableRides, View::Rides]);
    assert_eq!(seen[0].user_id, Some(rider.user_id));
    assert_eq!(seen[1].user_id, None);
    assert!(seen.iter().all(|e| e.ride_id == Some(ride.id)));
}

#[tokio::test]
async fn test_failed_booking_invalidates_nothing() {
    let h = harness();
    let mut rx = h.views.subscribe();
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 2, 1, RideStatus::Available).await;

    assert!(h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 2))
        .await
        .is_err());
    assert!(rx.try_recv().is_err());
}

#[derive(Default)]
struct RecordingPublisher {
    events: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, _key: &str, payload: &str) -> StoreResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn test_booking_event_is_published() {
    let publisher = Arc::new(RecordingPublisher::default());
    let h = harness_with(publisher.clone());
    let rider = Caller::rider(Uuid::new_v4());
    let ride = seed_ride(&h.store, 2, 2, RideStatus::Available).await;

    let booking = h
        .orchestrator
        .create_booking(Some(&rider), request(ride.id, 2))
        .await
        .unwrap();

    let events = publisher.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, BOOKING_CREATED_TOPIC);
    let payload: serde_json::Value = serde_json::from_str(&events[0].1).unwrap();
    assert_eq!(payload["booking_id"], booking.id.to_string());
    assert_eq!(payload["remaining_seats"], 0);
    assert_eq!(payload["ride_status"], "confirmed");
}

#[tokio::test]
async fn test_catalog_quote_and_delete() {
    let h = harness();
    let catalog = RideCatalog::new(&h.store.repositories(), h.views.clone(), 0.1);
    let ride = seed_ride(&h.store, 4, 4, RideStatus::Available).await;

    let quote = catalog.quote(ride.id, 2).await.unwrap();
    assert_eq!(quote.total, 14.3);

    catalog.delete(ride.id).await.unwrap();
    assert!(matches!(catalog.delete(ride.id).await, Err(CoreError::NotFound { .. })));
    assert!(matches!(catalog.get(ride.id).await, Err(CoreError::NotFound { .. })));
}
