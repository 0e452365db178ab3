use crate::events::{HoldEvent, HoldEvents};
use crate::store::{HoldPolicy, HoldStore};
use crate::{HoldError, HoldResult};
use capsule_availability::{
    AvailabilityResolver, RecommendPolicy, RecommendationResolver, RecommendedRoom,
};
use capsule_core::{
    Clock, Hold, HoldRepository, HoldStage, QualityTier, ReservationStore, Room, RoomInventory,
    StayRange, Zone,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates the booking funnel: availability queries, hold creation and
/// stage transitions, conversion into committed reservations, and
/// session-scoped teardown. This is the surface other subsystems call.
///
/// Exclusivity here is optimistic and best-effort. The pre-create re-check
/// narrows the race window but cannot close it; the reservation store's
/// atomic commit is the single hard guarantee, and a losing session gets
/// its conflict there.
pub struct HoldLifecycle {
    rooms: Arc<dyn RoomInventory>,
    reservations: Arc<dyn ReservationStore>,
    clock: Arc<dyn Clock>,
    store: HoldStore,
    availability: AvailabilityResolver,
    recommendations: RecommendationResolver,
    events: HoldEvents,
}

impl HoldLifecycle {
    pub fn new(
        rooms: Arc<dyn RoomInventory>,
        reservations: Arc<dyn ReservationStore>,
        holds: Arc<dyn HoldRepository>,
        clock: Arc<dyn Clock>,
        policy: HoldPolicy,
        recommend_policy: RecommendPolicy,
    ) -> Self {
        let store = HoldStore::new(holds.clone(), clock.clone(), policy);
        let availability = AvailabilityResolver::new(
            rooms.clone(),
            reservations.clone(),
            holds.clone(),
            clock.clone(),
        );
        let recommendations = RecommendationResolver::new(
            rooms.clone(),
            reservations.clone(),
            holds,
            clock.clone(),
            recommend_policy,
        );

        Self {
            rooms,
            reservations,
            clock,
            store,
            availability,
            recommendations,
            events: HoldEvents::default(),
        }
    }

    pub fn events(&self) -> &HoldEvents {
        &self.events
    }

    pub fn store(&self) -> &HoldStore {
        &self.store
    }

    /// Point-in-time snapshot of rooms free for the stay. Advisory only.
    pub async fn available_rooms(
        &self,
        stay: &StayRange,
        zone: Option<Zone>,
        quality: Option<QualityTier>,
        session_id: Option<&str>,
    ) -> HoldResult<Vec<Room>> {
        Ok(self
            .availability
            .find_available_rooms(stay, zone, quality, session_id)
            .await?)
    }

    /// Partially-available fallback suggestions for when the primary search
    /// comes back thin.
    pub async fn recommended_rooms(
        &self,
        stay: &StayRange,
        zone: Option<Zone>,
        quality: Option<QualityTier>,
        session_id: Option<&str>,
    ) -> HoldResult<Vec<RecommendedRoom>> {
        Ok(self
            .recommendations
            .find_recommended_rooms(stay, zone, quality, session_id)
            .await?)
    }

    /// Take a confirmation-stage hold on a room.
    ///
    /// The availability re-check and the insert are not atomic against a
    /// concurrent identical request, so two sessions may both get a hold
    /// for the same room and dates. That is intended soft-locking;
    /// conversion time sorts out the winner.
    pub async fn request_hold(
        &self,
        room_id: Uuid,
        stay: StayRange,
        session_id: &str,
        user_id: Option<Uuid>,
    ) -> HoldResult<Hold> {
        // 1. The room must exist and be administratively bookable
        let room = self
            .rooms
            .get(room_id)
            .await?
            .ok_or_else(|| HoldError::Validation(format!("unknown room {room_id}")))?;
        if !room.is_bookable() {
            return Err(HoldError::RoomUnavailable { room_id });
        }

        // 2. Committed reservations are ground truth
        let reserved = self
            .reservations
            .find_overlapping(room_id, &stay, None)
            .await?
            .iter()
            .any(|r| r.blocks_room());
        if reserved {
            return Err(HoldError::RoomUnavailable { room_id });
        }

        // 3. A rival session's live hold blocks; our own session's does not
        let rivals = self
            .store
            .find_active_overlapping(room_id, &stay, Some(session_id))
            .await?;
        if !rivals.is_empty() {
            warn!(room_id = %room_id, session_id = %session_id, "hold request lost to a rival hold");
            return Err(HoldError::RoomUnavailable { room_id });
        }

        // 4. Create at confirmation stage with the short ttl
        let hold = self
            .store
            .create(
                room_id,
                stay,
                session_id.to_string(),
                user_id,
                HoldStage::Confirmation,
                self.store.policy().confirmation_ttl,
            )
            .await?;

        self.events.publish(HoldEvent::Created {
            hold_id: hold.id,
            room_id,
            session_id: hold.session_id.clone(),
            expires_at: hold.expires_at,
        });
        Ok(hold)
    }

    /// Move a hold into the payment stage, granting the longer payment ttl
    /// (still capped by the total-lifetime bound). A hold that has expired
    /// or been converted is logically gone and reports `NotFound`; the
    /// session has to re-search.
    pub async fn extend_to_payment(&self, hold_id: Uuid) -> HoldResult<Hold> {
        let hold = self
            .store
            .get(hold_id)
            .await?
            .ok_or(HoldError::NotFound(hold_id))?;
        if !hold.is_active(self.clock.now()) {
            return Err(HoldError::NotFound(hold_id));
        }

        let new_expiry = self.clock.now() + self.store.policy().payment_ttl;
        self.store
            .advance_stage(hold_id, HoldStage::Payment, new_expiry)
            .await
    }

    /// Record the outcome of a successful external reservation commit. The
    /// reservation store has already enforced exclusivity atomically; this
    /// only retires the hold from contention and links the audit trail.
    pub async fn convert(&self, hold_id: Uuid, reservation_id: Uuid) -> HoldResult<Hold> {
        let hold = self.store.mark_converted(hold_id, reservation_id).await?;

        self.events.publish(HoldEvent::Converted {
            hold_id: hold.id,
            room_id: hold.room_id,
            reservation_id,
        });
        Ok(hold)
    }

    pub async fn session_holds(&self, session_id: &str, active_only: bool) -> HoldResult<Vec<Hold>> {
        self.store.find_by_session(session_id, active_only).await
    }

    /// Release a single hold. Idempotent: a second release of the same id
    /// is a silent no-op.
    pub async fn release(&self, hold_id: Uuid) -> HoldResult<()> {
        let hold = self.store.get(hold_id).await?;
        if self.store.release(hold_id).await? {
            if let Some(hold) = hold {
                self.events.publish(HoldEvent::Released {
                    hold_id: hold.id,
                    room_id: hold.room_id,
                    session_id: hold.session_id,
                });
            }
        }
        Ok(())
    }

    /// Session teardown: drop every hold the session owns (navigation away,
    /// explicit cancel, or session expiry upstream).
    pub async fn abandon(&self, session_id: &str) -> HoldResult<u64> {
        let holds = self.store.find_by_session(session_id, false).await?;
        let released = self.store.release_by_session(session_id).await?;

        for hold in holds {
            self.events.publish(HoldEvent::Released {
                hold_id: hold.id,
                room_id: hold.room_id,
                session_id: hold.session_id,
            });
        }
        Ok(released)
    }

    /// Reclaim storage for expired, unconverted holds. Read paths never
    /// depend on this having run.
    pub async fn sweep(&self) -> HoldResult<u64> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            info!(purged, "expiry sweep reclaimed holds");
        }
        Ok(purged)
    }
}
