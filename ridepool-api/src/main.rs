use anyhow::Context;
use ridepool_api::{
    app,
    state::{AppState, AuthConfig},
};
use ridepool_core::events::{EventPublisher, NullPublisher};
use ridepool_core::notify::{EventNotifier, LoggingNotifier, Notifier};
use ridepool_store::{app_config::Config, DbClient, EventProducer, MemoryStore, RedisClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ridepool_api=debug,ridepool_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Ridepool API on port {}", config.server.port);

    // Storage
    let repos = if config.database.in_memory {
        tracing::warn!("Using the in-memory store; data will not survive a restart");
        Arc::new(MemoryStore::new()).repositories()
    } else {
        let db = DbClient::new(&config.database)
            .await
            .context("Failed to connect to Postgres")?;
        db.migrate().await.context("Failed to run migrations")?;
        db.repositories()
    };

    // Kafka Connection
    let (publisher, notifier): (Arc<dyn EventPublisher>, Arc<dyn Notifier>) = match &config.kafka.brokers {
        Some(brokers) => {
            let producer: Arc<dyn EventPublisher> =
                Arc::new(EventProducer::new(brokers).context("Failed to create Kafka producer")?);
            (producer.clone(), Arc::new(EventNotifier::new(producer)))
        }
        None => {
            tracing::warn!("No Kafka brokers configured; events and emails are only logged");
            (Arc::new(NullPublisher), Arc::new(LoggingNotifier))
        }
    };

    let mut state = AppState::new(
        repos,
        publisher,
        notifier,
        AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
            allow_dev_tokens: config.auth.allow_dev_tokens,
        },
        config.booking.clone(),
    );

    // Redis Connection
    if let Some(url) = &config.redis.url {
        let redis = RedisClient::new(url).context("Invalid Redis URL")?;
        state = state.with_rate_limit(Arc::new(redis), config.redis.requests_per_minute);
    } else {
        tracing::warn!("No Redis configured; rate limiting disabled");
    }

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
