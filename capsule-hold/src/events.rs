use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Domain events emitted by the hold lifecycle, fanned out in-process for
/// interested consumers (live availability views, audit logging).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HoldEvent {
    Created {
        hold_id: Uuid,
        room_id: Uuid,
        session_id: String,
        expires_at: DateTime<Utc>,
    },
    Released {
        hold_id: Uuid,
        room_id: Uuid,
        session_id: String,
    },
    Converted {
        hold_id: Uuid,
        room_id: Uuid,
        reservation_id: Uuid,
    },
}

/// Broadcast fan-out for hold events. Sends are best-effort: with no
/// subscribers the event is simply dropped.
#[derive(Clone)]
pub struct HoldEvents {
    tx: broadcast::Sender<HoldEvent>,
}

impl HoldEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HoldEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: HoldEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for HoldEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_published_events() {
        let events = HoldEvents::default();
        let mut rx = events.subscribe();

        let hold_id = Uuid::new_v4();
        events.publish(HoldEvent::Released {
            hold_id,
            room_id: Uuid::new_v4(),
            session_id: "session-a".to_string(),
        });

        match rx.recv().await.unwrap() {
            HoldEvent::Released { hold_id: id, .. } => assert_eq!(id, hold_id),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_fine() {
        let events = HoldEvents::default();
        events.publish(HoldEvent::Converted {
            hold_id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            reservation_id: Uuid::new_v4(),
        });
    }
}
