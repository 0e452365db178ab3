use crate::store::HoldStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Background storage-reclamation loop. Purely an optimization: every
/// availability and overlap read filters expiry itself, so this task can
/// lag, die, or not run at all without affecting correctness.
pub fn spawn_sweeper(store: HoldStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(interval_secs = every.as_secs(), "hold sweeper started");
        loop {
            ticker.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "hold sweep reclaimed expired holds"),
                Err(e) => error!("hold sweep failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::HoldPolicy;
    use capsule_core::{HoldStage, ManualClock, StayRange};
    use capsule_store::memory::MemoryHoldRepository;
    use chrono::NaiveDate;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_purges_on_schedule() {
        let repo = Arc::new(MemoryHoldRepository::new());
        let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
        let store = HoldStore::new(repo.clone(), clock.clone(), HoldPolicy::default());

        let stay = StayRange::new(
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
        )
        .unwrap();
        store
            .create(
                Uuid::new_v4(),
                stay,
                "session-a".to_string(),
                None,
                HoldStage::Confirmation,
                chrono::Duration::minutes(5),
            )
            .await
            .unwrap();

        let handle = spawn_sweeper(store, Duration::from_secs(30));

        // Hold expires on the manual clock; the next tick reclaims it
        clock.advance(chrono::Duration::minutes(6));
        tokio::time::advance(Duration::from_secs(31)).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        assert!(repo.is_empty().await);
        handle.abort();
    }
}
