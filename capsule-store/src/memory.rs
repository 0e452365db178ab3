//! In-memory repositories. Used by the test suites and as the default
//! single-node backend; the Postgres repositories carry the same contracts
//! for deployments that need durable holds.

use async_trait::async_trait;
use capsule_core::{
    Hold, HoldRepository, NewReservation, QualityTier, Reservation, ReservationStatus,
    ReservationStore, Room, RoomInventory, RoomStatus, StayRange, StoreError, Zone,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryRoomInventory {
    rooms: RwLock<HashMap<Uuid, Room>>,
}

impl MemoryRoomInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, room: Room) {
        self.rooms.write().await.insert(room.id, room);
    }
}

#[async_trait]
impl RoomInventory for MemoryRoomInventory {
    async fn find_by_filter(
        &self,
        status: Option<RoomStatus>,
        zone: Option<Zone>,
        quality: Option<QualityTier>,
    ) -> Result<Vec<Room>, StoreError> {
        let rooms = self.rooms.read().await;
        Ok(rooms
            .values()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .filter(|r| zone.is_none_or(|z| r.zone == z))
            .filter(|r| quality.is_none_or(|q| r.quality == q))
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Room>, StoreError> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryReservationStore {
    reservations: RwLock<HashMap<Uuid, Reservation>>,
}

impl MemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn find_overlapping(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        exclude_reservation: Option<Uuid>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .filter(|r| r.room_id == room_id)
            .filter(|r| r.blocks_room())
            .filter(|r| r.stay.overlaps(stay))
            .filter(|r| exclude_reservation != Some(r.id))
            .cloned()
            .collect())
    }

    async fn find_overlapping_any(&self, stay: &StayRange) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations
            .values()
            .filter(|r| r.blocks_room())
            .filter(|r| r.stay.overlaps(stay))
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewReservation) -> Result<Reservation, StoreError> {
        // Overlap check and insert happen under one write lock, which is
        // what makes this commit path atomic: two racing sessions serialize
        // here and the second one sees the first one's row.
        let mut reservations = self.reservations.write().await;

        let blocks = new.status != ReservationStatus::Cancelled;
        if blocks {
            let conflict = reservations
                .values()
                .any(|r| r.room_id == new.room_id && r.blocks_room() && r.stay.overlaps(&new.stay));
            if conflict {
                return Err(StoreError::Conflict {
                    room_id: new.room_id,
                });
            }
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: new.room_id,
            stay: new.stay,
            status: new.status,
        };
        reservations.insert(reservation.id, reservation.clone());
        Ok(reservation)
    }
}

#[derive(Default)]
pub struct MemoryHoldRepository {
    holds: RwLock<HashMap<Uuid, Hold>>,
}

impl MemoryHoldRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records physically present, expired or not. Test hook.
    pub async fn len(&self) -> usize {
        self.holds.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.holds.read().await.is_empty()
    }
}

#[async_trait]
impl HoldRepository for MemoryHoldRepository {
    async fn insert(&self, hold: &Hold) -> Result<(), StoreError> {
        self.holds.write().await.insert(hold.id, hold.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Hold>, StoreError> {
        Ok(self.holds.read().await.get(&id).cloned())
    }

    async fn save(&self, hold: &Hold) -> Result<bool, StoreError> {
        let mut holds = self.holds.write().await;
        match holds.get_mut(&hold.id) {
            Some(existing) => {
                *existing = hold.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_active_overlapping(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        now: DateTime<Utc>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<Hold>, StoreError> {
        let holds = self.holds.read().await;
        Ok(holds
            .values()
            .filter(|h| h.room_id == room_id)
            .filter(|h| h.contends(stay, now, exclude_session))
            .cloned()
            .collect())
    }

    async fn find_contending(
        &self,
        stay: &StayRange,
        now: DateTime<Utc>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<Hold>, StoreError> {
        let holds = self.holds.read().await;
        Ok(holds
            .values()
            .filter(|h| h.contends(stay, now, exclude_session))
            .cloned()
            .collect())
    }

    async fn find_by_session(
        &self,
        session_id: &str,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError> {
        let holds = self.holds.read().await;
        Ok(holds
            .values()
            .filter(|h| h.session_id == session_id)
            .filter(|h| !active_only || h.is_active(now))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.holds.write().await.remove(&id).is_some())
    }

    async fn delete_by_session(&self, session_id: &str) -> Result<u64, StoreError> {
        let mut holds = self.holds.write().await;
        let before = holds.len();
        holds.retain(|_, h| h.session_id != session_id);
        Ok((before - holds.len()) as u64)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut holds = self.holds.write().await;
        let before = holds.len();
        holds.retain(|_, h| h.converted || !h.is_expired(now));
        let purged = (before - holds.len()) as u64;
        if purged > 0 {
            debug!(purged, "purged expired holds");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsule_core::HoldStage;
    use chrono::{Duration, NaiveDate};
    use std::sync::Arc;

    fn stay(from_day: u32, to_day: u32) -> StayRange {
        StayRange::new(
            NaiveDate::from_ymd_opt(2025, 3, from_day).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, to_day).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_reservation_commit_rejects_overlap() {
        let store = MemoryReservationStore::new();
        let room_id = Uuid::new_v4();

        store
            .create(NewReservation {
                room_id,
                stay: stay(1, 5),
                status: ReservationStatus::Confirmed,
            })
            .await
            .unwrap();

        let err = store
            .create(NewReservation {
                room_id,
                stay: stay(4, 8),
                status: ReservationStatus::Pending,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { room_id: r } if r == room_id));

        // Back-to-back stay on the turnover day is fine
        store
            .create(NewReservation {
                room_id,
                stay: stay(5, 8),
                status: ReservationStatus::Confirmed,
            })
            .await
            .unwrap();

        // Other rooms are unaffected
        store
            .create(NewReservation {
                room_id: Uuid::new_v4(),
                stay: stay(1, 5),
                status: ReservationStatus::Confirmed,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_commits_admit_exactly_one() {
        let store = Arc::new(MemoryReservationStore::new());
        let room_id = Uuid::new_v4();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .create(NewReservation {
                        room_id,
                        stay: stay(1, 5),
                        status: ReservationStatus::Confirmed,
                    })
                    .await
            }));
        }

        let mut committed = 0;
        let mut conflicts = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => committed += 1,
                Err(StoreError::Conflict { .. }) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(committed, 1);
        assert_eq!(conflicts, 7);
    }

    #[tokio::test]
    async fn test_cancelled_reservation_neither_conflicts_nor_blocks() {
        let store = MemoryReservationStore::new();
        let room_id = Uuid::new_v4();

        store
            .create(NewReservation {
                room_id,
                stay: stay(1, 5),
                status: ReservationStatus::Cancelled,
            })
            .await
            .unwrap();

        // A cancelled record neither blocks a new commit...
        store
            .create(NewReservation {
                room_id,
                stay: stay(1, 5),
                status: ReservationStatus::Confirmed,
            })
            .await
            .unwrap();

        // ...nor shows up in overlap queries
        let overlapping = store.find_overlapping(room_id, &stay(1, 5), None).await.unwrap();
        assert_eq!(overlapping.len(), 1);
        assert_eq!(overlapping[0].status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_purge_spares_converted_holds() {
        let repo = MemoryHoldRepository::new();
        let now = Utc::now();

        let expired = Hold::new(
            Uuid::new_v4(),
            stay(1, 3),
            "session-a".to_string(),
            None,
            HoldStage::Confirmation,
            now - Duration::minutes(10),
            Duration::minutes(5),
        );
        let mut converted = Hold::new(
            Uuid::new_v4(),
            stay(1, 3),
            "session-b".to_string(),
            None,
            HoldStage::Payment,
            now - Duration::minutes(10),
            Duration::minutes(5),
        );
        converted.converted = true;
        converted.reservation_id = Some(Uuid::new_v4());
        let live = Hold::new(
            Uuid::new_v4(),
            stay(1, 3),
            "session-c".to_string(),
            None,
            HoldStage::Confirmation,
            now,
            Duration::minutes(5),
        );

        repo.insert(&expired).await.unwrap();
        repo.insert(&converted).await.unwrap();
        repo.insert(&live).await.unwrap();

        assert_eq!(repo.purge_expired(now).await.unwrap(), 1);
        assert!(repo.get(expired.id).await.unwrap().is_none());
        assert!(repo.get(converted.id).await.unwrap().is_some());
        assert!(repo.get(live.id).await.unwrap().is_some());

        // Idempotent: a second sweep finds nothing
        assert_eq!(repo.purge_expired(now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_session_queries_and_bulk_delete() {
        let repo = MemoryHoldRepository::new();
        let now = Utc::now();

        let active = Hold::new(
            Uuid::new_v4(),
            stay(1, 3),
            "session-a".to_string(),
            None,
            HoldStage::Confirmation,
            now,
            Duration::minutes(5),
        );
        let expired = Hold::new(
            Uuid::new_v4(),
            stay(5, 7),
            "session-a".to_string(),
            None,
            HoldStage::Confirmation,
            now - Duration::minutes(10),
            Duration::minutes(5),
        );
        repo.insert(&active).await.unwrap();
        repo.insert(&expired).await.unwrap();

        let all = repo.find_by_session("session-a", false, now).await.unwrap();
        assert_eq!(all.len(), 2);

        let active_only = repo.find_by_session("session-a", true, now).await.unwrap();
        assert_eq!(active_only.len(), 1);
        assert_eq!(active_only[0].id, active.id);

        assert_eq!(repo.delete_by_session("session-a").await.unwrap(), 2);
        assert_eq!(repo.delete_by_session("session-a").await.unwrap(), 0);
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_save_reports_missing_hold() {
        let repo = MemoryHoldRepository::new();
        let hold = Hold::new(
            Uuid::new_v4(),
            stay(1, 3),
            "session-a".to_string(),
            None,
            HoldStage::Confirmation,
            Utc::now(),
            Duration::minutes(5),
        );

        assert!(!repo.save(&hold).await.unwrap());
        repo.insert(&hold).await.unwrap();

        let mut extended = hold.clone();
        extended.stage = HoldStage::Payment;
        assert!(repo.save(&extended).await.unwrap());
        assert_eq!(
            repo.get(hold.id).await.unwrap().unwrap().stage,
            HoldStage::Payment
        );
    }
}
