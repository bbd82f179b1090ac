use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ridepool_core::models::Profile;
use ridepool_core::repository::ProfileRepository;
use ridepool_core::StoreResult;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db_err;

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    full_name: String,
    email: String,
    phone: Option<String>,
    avatar_url: Option<String>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT id, full_name, email, phone, avatar_url, updated_at FROM profiles WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| Profile {
            id: r.id,
            full_name: r.full_name,
            email: r.email,
            phone: r.phone,
            avatar_url: r.avatar_url,
            updated_at: r.updated_at,
        }))
    }

    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, full_name, email, phone, avatar_url, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                avatar_url = EXCLUDED.avatar_url,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(profile.id)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(profile.phone.as_deref())
        .bind(profile.avatar_url.as_deref())
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }
}
