use ridepool_core::identity::Caller;
use ridepool_core::models::{Profile, ProfileUpdate};
use ridepool_core::repository::{ProfileRepository, Repositories};
use ridepool_core::{CoreError, CoreResult};
use ridepool_shared::Masked;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            profiles: repos.profiles.clone(),
        }
    }

    pub async fn get(&self, user_id: Uuid) -> CoreResult<Profile> {
        self.profiles
            .get_profile(user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Profile", user_id))
    }

    /// Like `get`, but a missing profile is not an error.
    pub async fn find(&self, user_id: Uuid) -> CoreResult<Option<Profile>> {
        Ok(self.profiles.get_profile(user_id).await?)
    }

    pub async fn update(&self, caller: &Caller, update: ProfileUpdate) -> CoreResult<Profile> {
        update.validate()?;
        let profile = update.into_profile(caller.user_id);
        self.profiles.upsert_profile(&profile).await?;
        info!("Profile {} saved ({})", profile.id, Masked(profile.email.as_str()));
        Ok(profile)
    }
}
