use chrono::Utc;
use ridepool_core::identity::Caller;
use ridepool_core::models::{NewRideRequest, RideRequest};
use ridepool_core::repository::{Repositories, RideRequestRepository};
use ridepool_core::CoreResult;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct RideRequestService {
    requests: Arc<dyn RideRequestRepository>,
}

impl RideRequestService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            requests: repos.ride_requests.clone(),
        }
    }

    pub async fn create(&self, caller: &Caller, draft: NewRideRequest) -> CoreResult<RideRequest> {
        draft.validate(Utc::now().date_naive())?;
        let request = draft.into_request(caller.user_id);
        self.requests.insert_ride_request(&request).await?;
        info!(
            "Ride request {} posted by {} for {} seat(s)",
            request.id, caller.user_id, request.seats_needed
        );
        Ok(request)
    }

    /// Newest first. Requests are only ever shown to their author.
    pub async fn list_for_user(&self, user_id: Uuid) -> CoreResult<Vec<RideRequest>> {
        let mut requests = self.requests.list_ride_requests_for_user(user_id).await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}
