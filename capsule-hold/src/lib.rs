pub mod events;
pub mod lifecycle;
pub mod store;
pub mod sweep;

pub use events::{HoldEvent, HoldEvents};
pub use lifecycle::HoldLifecycle;
pub use store::{HoldPolicy, HoldStore};
pub use sweep::spawn_sweeper;

use capsule_core::StoreError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum HoldError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Hold not found: {0}")]
    NotFound(Uuid),

    #[error("Room {room_id} is unavailable for the requested dates")]
    RoomUnavailable { room_id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type HoldResult<T> = Result<T, HoldError>;
