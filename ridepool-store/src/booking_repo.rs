use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ridepool_core::models::Booking;
use ridepool_core::repository::BookingRepository;
use ridepool_core::{StoreError, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_err;

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    ride_id: Uuid,
    user_id: Uuid,
    seats_booked: i32,
    total_amount: f64,
    booking_status: String,
    payment_status: String,
    payment_reference: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: String| StoreError::Corrupt(format!("booking {}: {}", id, e));
        Ok(Booking {
            id: row.id,
            ride_id: row.ride_id,
            user_id: row.user_id,
            seats_booked: row.seats_booked,
            total_amount: row.total_amount,
            booking_status: row.booking_status.parse().map_err(corrupt)?,
            payment_status: row.payment_status.parse().map_err(corrupt)?,
            payment_reference: row.payment_reference,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, ride_id, user_id, seats_booked, total_amount,
                                  booking_status, payment_status, payment_reference, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(booking.id)
        .bind(booking.ride_id)
        .bind(booking.user_id)
        .bind(booking.seats_booked)
        .bind(booking.total_amount)
        .bind(booking.booking_status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.payment_reference.as_deref())
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(
            r#"
            SELECT id, ride_id, user_id, seats_booked, total_amount,
                   booking_status, payment_status, payment_reference, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(Booking::try_from).collect()
    }
}
