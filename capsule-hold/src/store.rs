use crate::{HoldError, HoldResult};
use capsule_core::{Clock, Hold, HoldRepository, HoldStage, StayRange};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// TTL policy for the booking funnel. Extensions never push a hold past
/// `created_at + max_lifetime`, bounding how long an abandoned session can
/// pin a room.
#[derive(Debug, Clone)]
pub struct HoldPolicy {
    pub confirmation_ttl: Duration,
    pub payment_ttl: Duration,
    pub max_lifetime: Duration,
}

impl HoldPolicy {
    pub fn from_seconds(confirmation: u64, payment: u64, max_lifetime: u64) -> Self {
        Self {
            confirmation_ttl: Duration::seconds(confirmation as i64),
            payment_ttl: Duration::seconds(payment as i64),
            max_lifetime: Duration::seconds(max_lifetime as i64),
        }
    }
}

impl Default for HoldPolicy {
    fn default() -> Self {
        Self {
            confirmation_ttl: Duration::minutes(5),
            payment_ttl: Duration::minutes(10),
            max_lifetime: Duration::minutes(15),
        }
    }
}

/// Manages hold records and their expiry. Does no conflict checking of its
/// own: the lifecycle controller decides whether a hold may be created,
/// and the reservation store decides who finally wins a room.
#[derive(Clone)]
pub struct HoldStore {
    repo: Arc<dyn HoldRepository>,
    clock: Arc<dyn Clock>,
    policy: HoldPolicy,
}

impl HoldStore {
    pub fn new(repo: Arc<dyn HoldRepository>, clock: Arc<dyn Clock>, policy: HoldPolicy) -> Self {
        Self {
            repo,
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &HoldPolicy {
        &self.policy
    }

    pub async fn create(
        &self,
        room_id: Uuid,
        stay: StayRange,
        session_id: String,
        user_id: Option<Uuid>,
        stage: HoldStage,
        ttl: Duration,
    ) -> HoldResult<Hold> {
        if ttl <= Duration::zero() {
            return Err(HoldError::Validation(format!(
                "hold ttl must be positive, got {}s",
                ttl.num_seconds()
            )));
        }

        let hold = Hold::new(
            room_id,
            stay,
            session_id,
            user_id,
            stage,
            self.clock.now(),
            ttl,
        );
        self.repo.insert(&hold).await?;

        info!(
            hold_id = %hold.id,
            room_id = %room_id,
            session_id = %hold.session_id,
            expires_at = %hold.expires_at,
            "hold created"
        );
        Ok(hold)
    }

    pub async fn get(&self, hold_id: Uuid) -> HoldResult<Option<Hold>> {
        Ok(self.repo.get(hold_id).await?)
    }

    pub async fn find_active_overlapping(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        exclude_session: Option<&str>,
    ) -> HoldResult<Vec<Hold>> {
        let now = self.clock.now();
        Ok(self
            .repo
            .find_active_overlapping(room_id, stay, now, exclude_session)
            .await?)
    }

    pub async fn find_by_session(
        &self,
        session_id: &str,
        active_only: bool,
    ) -> HoldResult<Vec<Hold>> {
        let now = self.clock.now();
        Ok(self.repo.find_by_session(session_id, active_only, now).await?)
    }

    /// Push a hold's expiry out to `new_expiry`, clamped to the maximum
    /// total lifetime. `NotFound` when the hold has been released or purged.
    pub async fn extend(&self, hold_id: Uuid, new_expiry: DateTime<Utc>) -> HoldResult<Hold> {
        let mut hold = self
            .repo
            .get(hold_id)
            .await?
            .ok_or(HoldError::NotFound(hold_id))?;

        hold.expires_at = self.clamp_expiry(&hold, new_expiry);
        if !self.repo.save(&hold).await? {
            return Err(HoldError::NotFound(hold_id));
        }
        Ok(hold)
    }

    /// Advance the funnel stage and refresh expiry in one write. The stage
    /// only moves forward; re-asserting the current stage just refreshes
    /// the expiry.
    pub async fn advance_stage(
        &self,
        hold_id: Uuid,
        stage: HoldStage,
        new_expiry: DateTime<Utc>,
    ) -> HoldResult<Hold> {
        let mut hold = self
            .repo
            .get(hold_id)
            .await?
            .ok_or(HoldError::NotFound(hold_id))?;

        if hold.stage == HoldStage::Payment && stage == HoldStage::Confirmation {
            return Err(HoldError::Validation(
                "hold stage cannot move backwards".to_string(),
            ));
        }

        hold.stage = stage;
        hold.expires_at = self.clamp_expiry(&hold, new_expiry);
        if !self.repo.save(&hold).await? {
            return Err(HoldError::NotFound(hold_id));
        }

        debug!(hold_id = %hold.id, stage = %hold.stage, expires_at = %hold.expires_at, "hold advanced");
        Ok(hold)
    }

    /// Retire a hold from contention after the external reservation commit
    /// succeeded. Converted holds survive the expiry sweep as the audit
    /// trail for their reservation.
    pub async fn mark_converted(&self, hold_id: Uuid, reservation_id: Uuid) -> HoldResult<Hold> {
        let mut hold = self
            .repo
            .get(hold_id)
            .await?
            .ok_or(HoldError::NotFound(hold_id))?;

        hold.converted = true;
        hold.reservation_id = Some(reservation_id);
        if !self.repo.save(&hold).await? {
            return Err(HoldError::NotFound(hold_id));
        }

        info!(hold_id = %hold.id, reservation_id = %reservation_id, "hold converted");
        Ok(hold)
    }

    /// Unconditional delete; releasing a hold that is already gone is not
    /// an error. Returns whether a record was actually removed.
    pub async fn release(&self, hold_id: Uuid) -> HoldResult<bool> {
        let deleted = self.repo.delete(hold_id).await?;
        if deleted {
            debug!(hold_id = %hold_id, "hold released");
        }
        Ok(deleted)
    }

    pub async fn release_by_session(&self, session_id: &str) -> HoldResult<u64> {
        let released = self.repo.delete_by_session(session_id).await?;
        if released > 0 {
            info!(session_id = %session_id, released, "session holds released");
        }
        Ok(released)
    }

    /// Storage reclamation only: every read path filters expiry on its own,
    /// so correctness never depends on this having run.
    pub async fn purge_expired(&self) -> HoldResult<u64> {
        Ok(self.repo.purge_expired(self.clock.now()).await?)
    }

    fn clamp_expiry(&self, hold: &Hold, requested: DateTime<Utc>) -> DateTime<Utc> {
        requested.min(hold.created_at + self.policy.max_lifetime)
    }
}
