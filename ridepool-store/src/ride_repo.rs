use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ridepool_core::models::{Ride, RideFilter, RideStatus};
use ridepool_core::repository::RideRepository;
use ridepool_core::{StoreError, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_err;

const RIDE_COLUMNS: &str = "id, user_id, from_location, to_location, departure_date, departure_time, \
     total_seats, available_seats, price, status, created_at";

pub struct PgRideRepository {
    pool: PgPool,
}

impl PgRideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RideRow {
    id: Uuid,
    user_id: Uuid,
    from_location: String,
    to_location: String,
    departure_date: NaiveDate,
    departure_time: NaiveTime,
    total_seats: i32,
    available_seats: i32,
    price: f64,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RideRow> for Ride {
    type Error = StoreError;

    fn try_from(row: RideRow) -> Result<Self, Self::Error> {
        let status: RideStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("ride {}: {}", row.id, e)))?;

        Ok(Ride {
            id: row.id,
            user_id: row.user_id,
            from_location: row.from_location,
            to_location: row.to_location,
            departure_date: row.departure_date,
            departure_time: row.departure_time,
            total_seats: row.total_seats,
            available_seats: row.available_seats,
            price: row.price,
            status,
            created_at: row.created_at,
        })
    }
}

fn into_rides(rows: Vec<RideRow>) -> StoreResult<Vec<Ride>> {
    rows.into_iter().map(Ride::try_from).collect()
}

#[async_trait]
impl RideRepository for PgRideRepository {
    async fn get_ride(&self, id: Uuid) -> StoreResult<Option<Ride>> {
        let row = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {} FROM rides WHERE id = $1",
            RIDE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Ride::try_from).transpose()
    }

    async fn get_rides(&self, ids: &[Uuid]) -> StoreResult<Vec<Ride>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {} FROM rides WHERE id = ANY($1)",
            RIDE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        into_rides(rows)
    }

    async fn list_rides(&self) -> StoreResult<Vec<Ride>> {
        let rows = sqlx::query_as::<_, RideRow>(&format!(
            "SELECT {} FROM rides ORDER BY departure_date ASC, departure_time ASC",
            RIDE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        into_rides(rows)
    }

    async fn list_available_rides(
        &self,
        filter: &RideFilter,
        today: NaiveDate,
    ) -> StoreResult<Vec<Ride>> {
        let min_seats = filter.min_seats.unwrap_or(1).max(1);
        let from = filter.from.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let to = filter.to.as_deref().map(str::trim).filter(|s| !s.is_empty());

        let rows = sqlx::query_as::<_, RideRow>(&format!(
            r#"
            SELECT {}
            FROM rides
            WHERE status = 'available'
              AND available_seats >= $1
              AND departure_date >= $2
              AND ($3::text IS NULL OR lower(from_location) = lower($3))
              AND ($4::text IS NULL OR lower(to_location) = lower($4))
            ORDER BY departure_date ASC, departure_time ASC
            "#,
            RIDE_COLUMNS
        ))
        .bind(min_seats)
        .bind(today)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        into_rides(rows)
    }

    async fn insert_ride(&self, ride: &Ride) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO rides (id, user_id, from_location, to_location, departure_date, departure_time,
                               total_seats, available_seats, price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(ride.id)
        .bind(ride.user_id)
        .bind(&ride.from_location)
        .bind(&ride.to_location)
        .bind(ride.departure_date)
        .bind(ride.departure_time)
        .bind(ride.total_seats)
        .bind(ride.available_seats)
        .bind(ride.price)
        .bind(ride.status.as_str())
        .bind(ride.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn delete_ride(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM rides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn reserve_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>> {
        // Check and decrement in one statement so concurrent bookings cannot oversell.
        let row = sqlx::query_as::<_, RideRow>(&format!(
            r#"
            UPDATE rides
            SET available_seats = available_seats - $2,
                status = CASE WHEN available_seats - $2 = 0 THEN 'confirmed' ELSE 'available' END
            WHERE id = $1
              AND available_seats >= $2
              AND status IN ('available', 'confirmed')
            RETURNING {}
            "#,
            RIDE_COLUMNS
        ))
        .bind(id)
        .bind(seats)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Ride::try_from).transpose()
    }

    async fn release_seats(&self, id: Uuid, seats: i32) -> StoreResult<Option<Ride>> {
        let row = sqlx::query_as::<_, RideRow>(&format!(
            r#"
            UPDATE rides
            SET available_seats = LEAST(total_seats, available_seats + $2),
                status = CASE
                    WHEN status IN ('available', 'confirmed')
                         AND LEAST(total_seats, available_seats + $2) > 0 THEN 'available'
                    ELSE status
                END
            WHERE id = $1
            RETURNING {}
            "#,
            RIDE_COLUMNS
        ))
        .bind(id)
        .bind(seats)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Ride::try_from).transpose()
    }
}
