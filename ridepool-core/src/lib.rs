pub mod events;
pub mod identity;
pub mod models;
pub mod notify;
pub mod pricing;
pub mod repository;

use models::RideStatus;

/// Failures surfaced by the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Corrupt record: {0}")]
    Corrupt(String),
    #[error("Event publish failed: {0}")]
    Publish(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Typed failures of every rider/admin operation. Each variant maps to one
/// human-readable message.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("You must be signed in to do that")]
    Unauthenticated,
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Ride is not open for booking (status: {status})")]
    RideUnavailable { status: RideStatus },
    #[error("Only {remaining} seat(s) left, cannot book {requested}")]
    InsufficientCapacity { requested: i32, remaining: i32 },
    #[error("Storage error: {0}")]
    StorageError(#[from] StoreError),
}

impl CoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CoreError::InvalidInput(msg.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
