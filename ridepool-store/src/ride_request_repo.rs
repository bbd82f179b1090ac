use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ridepool_core::models::RideRequest;
use ridepool_core::repository::RideRequestRepository;
use ridepool_core::StoreResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_err;

pub struct PgRideRequestRepository {
    pool: PgPool,
}

impl PgRideRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RideRequestRow {
    id: Uuid,
    user_id: Uuid,
    from_location: String,
    to_location: String,
    preferred_date: NaiveDate,
    preferred_time: NaiveTime,
    seats_needed: i32,
    max_price: Option<f64>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<RideRequestRow> for RideRequest {
    fn from(row: RideRequestRow) -> Self {
        RideRequest {
            id: row.id,
            user_id: row.user_id,
            from_location: row.from_location,
            to_location: row.to_location,
            preferred_date: row.preferred_date,
            preferred_time: row.preferred_time,
            seats_needed: row.seats_needed,
            max_price: row.max_price,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl RideRequestRepository for PgRideRequestRepository {
    async fn insert_ride_request(&self, request: &RideRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO ride_requests (id, user_id, from_location, to_location, preferred_date,
                                       preferred_time, seats_needed, max_price, description, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(request.id)
        .bind(request.user_id)
        .bind(&request.from_location)
        .bind(&request.to_location)
        .bind(request.preferred_date)
        .bind(request.preferred_time)
        .bind(request.seats_needed)
        .bind(request.max_price)
        .bind(request.description.as_deref())
        .bind(request.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_ride_requests_for_user(&self, user_id: Uuid) -> StoreResult<Vec<RideRequest>> {
        let rows = sqlx::query_as::<_, RideRequestRow>(
            r#"
            SELECT id, user_id, from_location, to_location, preferred_date, preferred_time,
                   seats_needed, max_price, description, created_at
            FROM ride_requests
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(RideRequest::from).collect())
    }
}
