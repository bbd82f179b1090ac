pub mod catalog;
pub mod locks;
pub mod orchestrator;
pub mod profiles;
pub mod requests;

pub use catalog::RideCatalog;
pub use locks::RideLocks;
pub use orchestrator::{BookingOrchestrator, BookingRequest};
pub use profiles::ProfileService;
pub use requests::RideRequestService;

use ridepool_shared::models::events::{View, ViewInvalidatedEvent};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Fan-out channel for view invalidations; the API streams it to clients.
pub type ViewSender = broadcast::Sender<ViewInvalidatedEvent>;

/// Announce that `views` are stale. Having no subscribers is not an error.
pub(crate) fn invalidate(tx: &ViewSender, views: &[View], user_id: Option<Uuid>, ride_id: Option<Uuid>) {
    for view in views {
        let scoped_user = match view {
            View::UserBookings => user_id,
            _ => None,
        };
        let _ = tx.send(ViewInvalidatedEvent::new(*view, scoped_user, ride_id));
    }
}
