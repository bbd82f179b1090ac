use async_trait::async_trait;
use tracing::debug;

use crate::StoreResult;

/// Outbound domain-event sink (Kafka in production).
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &str, payload: &str) -> StoreResult<()>;
}

/// Drops every event. Used when no broker is configured.
pub struct NullPublisher;

#[async_trait]
impl EventPublisher for NullPublisher {
    async fn publish(&self, topic: &str, key: &str, _payload: &str) -> StoreResult<()> {
        debug!("No broker configured, dropping {}/{}", topic, key);
        Ok(())
    }
}
