use ridepool_core::repository::Repositories;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::app_config::DatabaseConfig;
use crate::{PgBookingRepository, PgProfileRepository, PgRideRepository, PgRideRequestRepository};

#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    /// Postgres-backed repositories sharing this pool.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            rides: Arc::new(PgRideRepository::new(self.pool.clone())),
            bookings: Arc::new(PgBookingRepository::new(self.pool.clone())),
            ride_requests: Arc::new(PgRideRequestRepository::new(self.pool.clone())),
            profiles: Arc::new(PgProfileRepository::new(self.pool.clone())),
        }
    }
}
