use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inventory zone a pod belongs to, grouping rooms by guest segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    WomenOnly,
    MenOnly,
    Couples,
    Business,
}

impl Zone {
    /// Adjacent zone offered when the requested zone has nothing left.
    /// Single-gender zones fall back to the mixed business zone; the
    /// business and couples zones have no substitute.
    pub fn fallback(&self) -> Option<Zone> {
        match self {
            Zone::WomenOnly | Zone::MenOnly => Some(Zone::Business),
            Zone::Couples | Zone::Business => None,
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Zone::WomenOnly => "WOMEN_ONLY",
            Zone::MenOnly => "MEN_ONLY",
            Zone::Couples => "COUPLES",
            Zone::Business => "BUSINESS",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WOMEN_ONLY" => Ok(Zone::WomenOnly),
            "MEN_ONLY" => Ok(Zone::MenOnly),
            "COUPLES" => Ok(Zone::Couples),
            "BUSINESS" => Ok(Zone::Business),
            other => Err(format!("unknown zone: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityTier {
    Classic,
    Deluxe,
    Suite,
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QualityTier::Classic => "CLASSIC",
            QualityTier::Deluxe => "DELUXE",
            QualityTier::Suite => "SUITE",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for QualityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLASSIC" => Ok(QualityTier::Classic),
            "DELUXE" => Ok(QualityTier::Deluxe),
            "SUITE" => Ok(QualityTier::Suite),
            other => Err(format!("unknown quality tier: {other}")),
        }
    }
}

/// Administrative room status set by operators. Independent of date-based
/// availability: a room can be `Available` here and still be fully booked
/// for a given window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
    Reserved,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoomStatus::Available => "AVAILABLE",
            RoomStatus::Occupied => "OCCUPIED",
            RoomStatus::Maintenance => "MAINTENANCE",
            RoomStatus::Reserved => "RESERVED",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for RoomStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(RoomStatus::Available),
            "OCCUPIED" => Ok(RoomStatus::Occupied),
            "MAINTENANCE" => Ok(RoomStatus::Maintenance),
            "RESERVED" => Ok(RoomStatus::Reserved),
            other => Err(format!("unknown room status: {other}")),
        }
    }
}

/// A pod. Date-based availability is never stored here; it is derived per
/// query from reservations and holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    /// Human-facing pod number, e.g. "classic-101".
    pub number: String,
    pub zone: Zone,
    pub quality: QualityTier,
    pub status: RoomStatus,
    /// Nightly rate in cents.
    pub nightly_rate: i32,
}

impl Room {
    pub fn is_bookable(&self) -> bool {
        self.status == RoomStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_fallback() {
        assert_eq!(Zone::WomenOnly.fallback(), Some(Zone::Business));
        assert_eq!(Zone::MenOnly.fallback(), Some(Zone::Business));
        assert_eq!(Zone::Couples.fallback(), None);
        assert_eq!(Zone::Business.fallback(), None);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&RoomStatus::Maintenance).unwrap();
        assert_eq!(json, r#""MAINTENANCE""#);

        let zone: Zone = serde_json::from_str(r#""WOMEN_ONLY""#).unwrap();
        assert_eq!(zone, Zone::WomenOnly);
    }
}
