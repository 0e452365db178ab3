use crate::stay::StayRange;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position of a hold in the booking funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldStage {
    Confirmation,
    Payment,
}

impl std::fmt::Display for HoldStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HoldStage::Confirmation => "CONFIRMATION",
            HoldStage::Payment => "PAYMENT",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for HoldStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONFIRMATION" => Ok(HoldStage::Confirmation),
            "PAYMENT" => Ok(HoldStage::Payment),
            other => Err(format!("unknown hold stage: {other}")),
        }
    }
}

/// A temporary, expiring soft-reservation of a room for one browsing
/// session. Not a committed booking: several sessions may hold the same
/// room and dates at once, and only the reservation store's atomic commit
/// decides the winner.
///
/// Room and stay are immutable after creation; only `stage`, `expires_at`,
/// `converted` and `reservation_id` ever change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hold {
    pub id: Uuid,
    pub room_id: Uuid,
    pub stay: StayRange,
    pub session_id: String,
    pub user_id: Option<Uuid>,
    pub stage: HoldStage,
    pub expires_at: DateTime<Utc>,
    pub converted: bool,
    /// Set once the hold has been converted into a committed reservation.
    pub reservation_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Hold {
    pub fn new(
        room_id: Uuid,
        stay: StayRange,
        session_id: String,
        user_id: Option<Uuid>,
        stage: HoldStage,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            stay,
            session_id,
            user_id,
            stage,
            expires_at: now + ttl,
            converted: false,
            reservation_id: None,
            created_at: now,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// An active hold still counts toward contention: not yet converted and
    /// not yet past its expiry. Physical purging may lag; callers must use
    /// this check rather than mere existence.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.converted && !self.is_expired(now)
    }

    /// Whether this hold blocks `stay` on its room for sessions other than
    /// `exclude_session`.
    pub fn contends(
        &self,
        stay: &StayRange,
        now: DateTime<Utc>,
        exclude_session: Option<&str>,
    ) -> bool {
        if !self.is_active(now) {
            return false;
        }
        if exclude_session.is_some_and(|s| s == self.session_id) {
            return false;
        }
        self.stay.overlaps(stay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stay() -> StayRange {
        StayRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        )
        .unwrap()
    }

    fn hold_at(now: DateTime<Utc>) -> Hold {
        Hold::new(
            Uuid::new_v4(),
            stay(),
            "session-a".to_string(),
            None,
            HoldStage::Confirmation,
            now,
            Duration::minutes(5),
        )
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let hold = hold_at(now);

        assert!(hold.is_active(now));
        assert!(hold.is_active(now + Duration::minutes(5) - Duration::seconds(1)));
        // Expiry instant itself is inert
        assert!(!hold.is_active(now + Duration::minutes(5)));
    }

    #[test]
    fn test_converted_hold_never_contends() {
        let now = Utc::now();
        let mut hold = hold_at(now);
        assert!(hold.contends(&stay(), now, None));

        hold.converted = true;
        hold.reservation_id = Some(Uuid::new_v4());
        assert!(!hold.contends(&stay(), now, None));
    }

    #[test]
    fn test_own_session_is_excluded() {
        let now = Utc::now();
        let hold = hold_at(now);

        assert!(!hold.contends(&stay(), now, Some("session-a")));
        assert!(hold.contends(&stay(), now, Some("session-b")));
        assert!(hold.contends(&stay(), now, None));
    }

    #[test]
    fn test_disjoint_stay_does_not_contend() {
        let now = Utc::now();
        let hold = hold_at(now);
        let later = StayRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
        )
        .unwrap();
        assert!(!hold.contends(&later, now, None));
    }
}
