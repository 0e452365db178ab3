use capsule_core::{
    Clock, Hold, HoldRepository, QualityTier, Reservation, ReservationStore, Room, RoomInventory,
    RoomStatus, StayRange, StoreError, Zone,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Largest tolerated blocked-night share for a room to still be suggested.
pub const MAX_UNAVAILABLE_FRACTION: f64 = 0.33;

/// Suggestion list length cap.
pub const MAX_RECOMMENDATIONS: usize = 5;

/// Tuning knobs for the recommendation heuristic. Defaults match the
/// platform-wide constants; deployments may override via business rules.
#[derive(Debug, Clone)]
pub struct RecommendPolicy {
    pub max_unavailable_fraction: f64,
    pub max_results: usize,
}

impl Default for RecommendPolicy {
    fn default() -> Self {
        Self {
            max_unavailable_fraction: MAX_UNAVAILABLE_FRACTION,
            max_results: MAX_RECOMMENDATIONS,
        }
    }
}

/// A partially-available room surfaced as an alternative suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendedRoom {
    pub room: Room,
    pub available_nights: i64,
    pub total_nights: i64,
    /// Rounded share of the requested nights this room is free for.
    pub availability_pct: u8,
    /// True when the room sits in the adjacency-fallback zone rather than
    /// the zone the caller asked for.
    pub outside_requested_zone: bool,
}

/// Relaxation of the availability resolver: when nothing is fully free,
/// propose rooms that are only partially blocked over the requested window,
/// plus rooms from the fixed zone-adjacency fallback.
///
/// Heuristic upsell path, not correctness-critical: fully free rooms are
/// the availability resolver's business and are not duplicated here.
pub struct RecommendationResolver {
    rooms: Arc<dyn RoomInventory>,
    reservations: Arc<dyn ReservationStore>,
    holds: Arc<dyn HoldRepository>,
    clock: Arc<dyn Clock>,
    policy: RecommendPolicy,
}

impl RecommendationResolver {
    pub fn new(
        rooms: Arc<dyn RoomInventory>,
        reservations: Arc<dyn ReservationStore>,
        holds: Arc<dyn HoldRepository>,
        clock: Arc<dyn Clock>,
        policy: RecommendPolicy,
    ) -> Self {
        Self {
            rooms,
            reservations,
            holds,
            clock,
            policy,
        }
    }

    pub async fn find_recommended_rooms(
        &self,
        stay: &StayRange,
        zone: Option<Zone>,
        quality: Option<QualityTier>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<RecommendedRoom>, StoreError> {
        let now = self.clock.now();
        let total_nights = stay.nights();

        // 1. Candidate set: requested zone plus its fixed fallback zone.
        //    No zone filter means every zone qualifies and nothing is
        //    flagged as out-of-zone.
        let mut candidates = self
            .rooms
            .find_by_filter(Some(RoomStatus::Available), zone, quality)
            .await?;
        if let Some(fallback) = zone.and_then(|z| z.fallback()) {
            candidates.extend(
                self.rooms
                    .find_by_filter(Some(RoomStatus::Available), Some(fallback), quality)
                    .await?,
            );
        }

        // 2. Blocked nights per room, clipped to the query window
        let reservations = self.reservations.find_overlapping_any(stay).await?;
        let holds = self
            .holds
            .find_contending(stay, now, exclude_session)
            .await?;
        let blocked_nights = blocked_nights_by_room(stay, &reservations, &holds);

        // 3. Keep the partially-blocked band: fully free rooms belong to the
        //    availability resolver, fully (or mostly) blocked ones are
        //    useless as suggestions.
        let mut suggested: Vec<RecommendedRoom> = candidates
            .into_iter()
            .filter_map(|room| {
                let blocked = blocked_nights
                    .get(&room.id)
                    .copied()
                    .unwrap_or(0)
                    .min(total_nights);
                if blocked == 0 {
                    return None;
                }
                let fraction = blocked as f64 / total_nights as f64;
                if fraction > self.policy.max_unavailable_fraction {
                    return None;
                }

                let available = total_nights - blocked;
                let outside = zone.is_some_and(|z| room.zone != z);
                Some(RecommendedRoom {
                    availability_pct: ((available as f64 / total_nights as f64) * 100.0).round()
                        as u8,
                    available_nights: available,
                    total_nights,
                    outside_requested_zone: outside,
                    room,
                })
            })
            .collect();

        suggested.sort_by(|a, b| {
            a.room
                .nightly_rate
                .cmp(&b.room.nightly_rate)
                .then_with(|| a.room.number.cmp(&b.room.number))
                .then_with(|| a.room.id.cmp(&b.room.id))
        });
        suggested.truncate(self.policy.max_results);

        debug!(suggestions = suggested.len(), "recommendation snapshot");
        Ok(suggested)
    }
}

/// Sum of blocking nights per room over the query window. Cancelled
/// reservations are skipped here; holds arrive pre-filtered to active
/// contenders.
fn blocked_nights_by_room(
    stay: &StayRange,
    reservations: &[Reservation],
    holds: &[Hold],
) -> HashMap<Uuid, i64> {
    let mut blocked: HashMap<Uuid, i64> = HashMap::new();
    for r in reservations.iter().filter(|r| r.blocks_room()) {
        *blocked.entry(r.room_id).or_default() += stay.overlap_nights(&r.stay);
    }
    for h in holds {
        *blocked.entry(h.room_id).or_default() += stay.overlap_nights(&h.stay);
    }
    blocked
}
