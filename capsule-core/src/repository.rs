use crate::hold::Hold;
use crate::reservation::{NewReservation, Reservation};
use crate::room::{QualityTier, Room, RoomStatus, Zone};
use crate::stay::StayRange;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Storage-layer failure taxonomy shared by all repositories.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The reservation store's atomic commit check found a competing
    /// non-cancelled reservation for the same room and overlapping dates.
    #[error("conflicting reservation for room {room_id}")]
    Conflict { room_id: Uuid },

    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Room inventory access. Consumed, not owned: rooms and their
/// administrative status are maintained elsewhere.
#[async_trait]
pub trait RoomInventory: Send + Sync {
    async fn find_by_filter(
        &self,
        status: Option<RoomStatus>,
        zone: Option<Zone>,
        quality: Option<QualityTier>,
    ) -> Result<Vec<Room>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Room>, StoreError>;
}

/// Authoritative committed-reservation access.
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Non-cancelled reservations for `room_id` overlapping `stay`.
    async fn find_overlapping(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        exclude_reservation: Option<Uuid>,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Non-cancelled reservations overlapping `stay` across all rooms.
    async fn find_overlapping_any(&self, stay: &StayRange) -> Result<Vec<Reservation>, StoreError>;

    /// Commit a reservation. Implementations MUST re-validate non-overlap
    /// against other committed reservations atomically at insert time and
    /// fail with [`StoreError::Conflict`]. This is the only hard
    /// exclusivity guarantee in the whole booking path.
    async fn create(&self, new: NewReservation) -> Result<Reservation, StoreError>;
}

/// Persistent hold records. Every query over active holds filters on
/// `expires_at > now` and `converted = false` in the query itself; physical
/// purging is asynchronous and best-effort, never a correctness dependency.
#[async_trait]
pub trait HoldRepository: Send + Sync {
    async fn insert(&self, hold: &Hold) -> Result<(), StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Hold>, StoreError>;

    /// Persist mutated fields of an existing hold. Returns `false` when the
    /// hold no longer exists (released or purged in the meantime).
    async fn save(&self, hold: &Hold) -> Result<bool, StoreError>;

    /// Active holds for `room_id` overlapping `stay`, optionally excluding
    /// one session so it does not block itself.
    async fn find_active_overlapping(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        now: DateTime<Utc>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<Hold>, StoreError>;

    /// Active holds overlapping `stay` across all rooms.
    async fn find_contending(
        &self,
        stay: &StayRange,
        now: DateTime<Utc>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<Hold>, StoreError>;

    async fn find_by_session(
        &self,
        session_id: &str,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError>;

    /// Returns `true` if a hold was actually deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_by_session(&self, session_id: &str) -> Result<u64, StoreError>;

    /// Delete expired, unconverted holds. Converted holds are exempt even
    /// when past expiry: they are the audit trail for their reservation
    /// and fall under a separate retention policy.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
