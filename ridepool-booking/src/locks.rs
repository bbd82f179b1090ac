use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per ride, created on demand.
///
/// Entries nobody holds or waits on are pruned on the next `acquire`.
#[derive(Default)]
pub struct RideLocks {
    inner: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl RideLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `ride_id`. Released when the guard drops.
    pub async fn acquire(&self, ride_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            map.retain(|_, l| Arc::strong_count(l) > 1);
            map.entry(ride_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Rides with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
