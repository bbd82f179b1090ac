pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod memory;
pub mod profile_repo;
pub mod redis_repo;
pub mod ride_repo;
pub mod ride_request_repo;

pub use booking_repo::PgBookingRepository;
pub use database::DbClient;
pub use events::EventProducer;
pub use memory::MemoryStore;
pub use profile_repo::PgProfileRepository;
pub use redis_repo::RedisClient;
pub use ride_repo::PgRideRepository;
pub use ride_request_repo::PgRideRequestRepository;

use ridepool_core::StoreError;

pub(crate) fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}
