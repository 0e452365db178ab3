use capsule_core::{
    Clock, HoldRepository, QualityTier, ReservationStore, Room, RoomInventory, RoomStatus,
    StayRange, StoreError, Zone,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Computes which rooms are free of both committed reservations and active
/// competing holds for a requested stay.
///
/// The result is a point-in-time snapshot and advisory only: another
/// session's hold or reservation can land between this query and a
/// follow-up hold request. The reservation store's atomic commit is the
/// final authority.
pub struct AvailabilityResolver {
    rooms: Arc<dyn RoomInventory>,
    reservations: Arc<dyn ReservationStore>,
    holds: Arc<dyn HoldRepository>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityResolver {
    pub fn new(
        rooms: Arc<dyn RoomInventory>,
        reservations: Arc<dyn ReservationStore>,
        holds: Arc<dyn HoldRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            reservations,
            holds,
            clock,
        }
    }

    /// Rooms administratively available, free of overlapping non-cancelled
    /// reservations and of active holds from other sessions, ordered by
    /// nightly rate ascending (ties by room number, then id).
    pub async fn find_available_rooms(
        &self,
        stay: &StayRange,
        zone: Option<Zone>,
        quality: Option<QualityTier>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<Room>, StoreError> {
        let now = self.clock.now();

        // 1. Candidate rooms: administrative status wins over everything
        let candidates = self
            .rooms
            .find_by_filter(Some(RoomStatus::Available), zone, quality)
            .await?;

        // 2. Rooms blocked by committed reservations
        let mut blocked: HashSet<Uuid> = self
            .reservations
            .find_overlapping_any(stay)
            .await?
            .iter()
            .filter(|r| r.blocks_room())
            .map(|r| r.room_id)
            .collect();

        // 3. Rooms blocked by rival sessions' active holds. The repository
        //    filters expiry in the query; purge lag must never matter here.
        for hold in self
            .holds
            .find_contending(stay, now, exclude_session)
            .await?
        {
            blocked.insert(hold.room_id);
        }

        debug!(
            candidates = candidates.len(),
            blocked = blocked.len(),
            "availability snapshot"
        );

        let mut free: Vec<Room> = candidates
            .into_iter()
            .filter(|room| !blocked.contains(&room.id))
            .collect();

        free.sort_by(|a, b| {
            a.nightly_rate
                .cmp(&b.nightly_rate)
                .then_with(|| a.number.cmp(&b.number))
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(free)
    }

    /// Whether a specific room is free for `stay`: the pre-create check
    /// used by the hold lifecycle. Committed reservations are consulted
    /// first, then rival holds.
    pub async fn is_room_free(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        exclude_session: Option<&str>,
    ) -> Result<bool, StoreError> {
        let now = self.clock.now();

        let reserved = self
            .reservations
            .find_overlapping(room_id, stay, None)
            .await?
            .iter()
            .any(|r| r.blocks_room());
        if reserved {
            return Ok(false);
        }

        let held = self
            .holds
            .find_active_overlapping(room_id, stay, now, exclude_session)
            .await?;
        Ok(held.is_empty())
    }
}
