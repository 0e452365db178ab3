use crate::stay::StayRange;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::CheckedIn => "CHECKED_IN",
            ReservationStatus::CheckedOut => "CHECKED_OUT",
            ReservationStatus::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "CHECKED_IN" => Ok(ReservationStatus::CheckedIn),
            "CHECKED_OUT" => Ok(ReservationStatus::CheckedOut),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            other => Err(format!("unknown reservation status: {other}")),
        }
    }
}

/// A committed booking. Ground truth: any non-cancelled reservation blocks
/// its room for its stay, and the hold system never overrides it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub room_id: Uuid,
    pub stay: StayRange,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn blocks_room(&self) -> bool {
        self.status != ReservationStatus::Cancelled
    }
}

/// Payload for the reservation store's atomic commit path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReservation {
    pub room_id: Uuid,
    pub stay: StayRange,
    pub status: ReservationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cancelled_reservation_does_not_block() {
        let stay = StayRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        )
        .unwrap();

        let mut reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            stay,
            status: ReservationStatus::Confirmed,
        };
        assert!(reservation.blocks_room());

        reservation.status = ReservationStatus::Cancelled;
        assert!(!reservation.blocks_room());

        for status in [
            ReservationStatus::Pending,
            ReservationStatus::CheckedIn,
            ReservationStatus::CheckedOut,
        ] {
            reservation.status = status;
            assert!(reservation.blocks_room());
        }
    }
}
