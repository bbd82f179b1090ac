use chrono::Utc;
use ridepool_core::identity::Caller;
use ridepool_core::models::{NewRide, Ride, RideFilter};
use ridepool_core::pricing::{self, Quote};
use ridepool_core::repository::{Repositories, RideRepository};
use ridepool_core::{CoreError, CoreResult};
use ridepool_shared::models::events::View;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{invalidate, ViewSender};

/// Ride listings, publishing, admin deletion and price quotes.
pub struct RideCatalog {
    rides: Arc<dyn RideRepository>,
    views: ViewSender,
    service_fee_rate: f64,
}

impl RideCatalog {
    pub fn new(repos: &Repositories, views: ViewSender, service_fee_rate: f64) -> Self {
        Self {
            rides: repos.rides.clone(),
            views,
            service_fee_rate,
        }
    }

    pub async fn list_available(&self, filter: &RideFilter) -> CoreResult<Vec<Ride>> {
        let today = Utc::now().date_naive();
        Ok(self.rides.list_available_rides(filter, today).await?)
    }

    /// Every ride regardless of status, for the admin console.
    pub async fn list_all(&self) -> CoreResult<Vec<Ride>> {
        Ok(self.rides.list_rides().await?)
    }

    pub async fn get(&self, ride_id: Uuid) -> CoreResult<Ride> {
        self.rides
            .get_ride(ride_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Ride", ride_id))
    }

    pub async fn publish(&self, caller: &Caller, draft: NewRide) -> CoreResult<Ride> {
        draft.validate(Utc::now().date_naive())?;
        let ride = Ride::publish(caller.user_id, draft);
        self.rides.insert_ride(&ride).await?;

        info!(
            "Ride {} published by {}: {} -> {} on {}",
            ride.id, caller.user_id, ride.from_location, ride.to_location, ride.departure_date
        );
        invalidate(&self.views, &[View::AvailableRides, View::Rides], None, Some(ride.id));
        Ok(ride)
    }

    pub async fn delete(&self, ride_id: Uuid) -> CoreResult<()> {
        if !self.rides.delete_ride(ride_id).await? {
            return Err(CoreError::not_found("Ride", ride_id));
        }
        info!("Ride {} deleted", ride_id);
        invalidate(&self.views, &[View::AvailableRides, View::Rides], None, Some(ride_id));
        Ok(())
    }

    pub async fn quote(&self, ride_id: Uuid, seats: i32) -> CoreResult<Quote> {
        let ride = self.get(ride_id).await?;
        pricing::quote(&ride, seats, self.service_fee_rate)
    }
}
