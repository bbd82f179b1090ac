use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

pub const MAX_SEATS_NEEDED: i32 = 6;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// A rider's open demand for a trip, not tied to any published ride.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RideRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub from_location: String,
    pub to_location: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    pub seats_needed: i32,
    pub max_price: Option<f64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRideRequest {
    pub from_location: String,
    pub to_location: String,
    pub preferred_date: NaiveDate,
    pub preferred_time: NaiveTime,
    pub seats_needed: i32,
    pub max_price: Option<f64>,
    pub description: Option<String>,
}

impl NewRideRequest {
    pub fn validate(&self, today: NaiveDate) -> CoreResult<()> {
        let from = self.from_location.trim();
        let to = self.to_location.trim();
        if from.is_empty() || to.is_empty() {
            return Err(CoreError::invalid("pickup and destination are required"));
        }
        if from.eq_ignore_ascii_case(to) {
            return Err(CoreError::invalid("pickup and destination must differ"));
        }
        if !(1..=MAX_SEATS_NEEDED).contains(&self.seats_needed) {
            return Err(CoreError::invalid(format!(
                "seats_needed must be between 1 and {}",
                MAX_SEATS_NEEDED
            )));
        }
        if let Some(price) = self.max_price {
            if !price.is_finite() || price < 0.0 {
                return Err(CoreError::invalid("max_price must be a non-negative amount"));
            }
        }
        if let Some(desc) = &self.description {
            if desc.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(CoreError::invalid(format!(
                    "description is limited to {} characters",
                    MAX_DESCRIPTION_LEN
                )));
            }
        }
        if self.preferred_date < today {
            return Err(CoreError::invalid("preferred date is in the past"));
        }
        Ok(())
    }

    pub fn into_request(self, user_id: Uuid) -> RideRequest {
        RideRequest {
            id: Uuid::new_v4(),
            user_id,
            from_location: self.from_location.trim().to_string(),
            to_location: self.to_location.trim().to_string(),
            preferred_date: self.preferred_date,
            preferred_time: self.preferred_time,
            seats_needed: self.seats_needed,
            max_price: self.max_price,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            created_at: Utc::now(),
        }
    }
}
