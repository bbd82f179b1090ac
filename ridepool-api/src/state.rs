use ridepool_booking::{BookingOrchestrator, ProfileService, RideCatalog, RideRequestService, ViewSender};
use ridepool_core::events::EventPublisher;
use ridepool_core::notify::Notifier;
use ridepool_core::repository::Repositories;
use ridepool_store::app_config::BookingRules;
use ridepool_store::RedisClient;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
    pub allow_dev_tokens: bool,
}

#[derive(Clone)]
pub struct RateLimit {
    pub redis: Arc<RedisClient>,
    pub requests_per_minute: i64,
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<BookingOrchestrator>,
    pub catalog: Arc<RideCatalog>,
    pub ride_requests: Arc<RideRequestService>,
    pub profiles: Arc<ProfileService>,
    pub notifier: Arc<dyn Notifier>,
    pub views_tx: ViewSender,
    pub auth: AuthConfig,
    pub rules: BookingRules,
    /// Unset when no Redis is configured; requests are then not limited.
    pub rate_limit: Option<RateLimit>,
}

impl AppState {
    pub fn new(
        repos: Repositories,
        publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn Notifier>,
        auth: AuthConfig,
        rules: BookingRules,
    ) -> Self {
        let (views_tx, _) = broadcast::channel(100);

        Self {
            orchestrator: Arc::new(BookingOrchestrator::new(&repos, publisher, views_tx.clone())),
            catalog: Arc::new(RideCatalog::new(&repos, views_tx.clone(), rules.service_fee_rate)),
            ride_requests: Arc::new(RideRequestService::new(&repos)),
            profiles: Arc::new(ProfileService::new(&repos)),
            notifier,
            views_tx,
            auth,
            rules,
            rate_limit: None,
        }
    }

    pub fn with_rate_limit(mut self, redis: Arc<RedisClient>, requests_per_minute: i64) -> Self {
        self.rate_limit = Some(RateLimit {
            redis,
            requests_per_minute,
        });
        self
    }
}
