use async_trait::async_trait;
use capsule_core::{QualityTier, Room, RoomInventory, RoomStatus, StoreError, Zone};
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

pub struct PgRoomInventory {
    pool: PgPool,
}

impl PgRoomInventory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    number: String,
    zone: String,
    quality: String,
    status: String,
    nightly_rate: i32,
}

impl TryFrom<RoomRow> for Room {
    type Error = StoreError;

    fn try_from(row: RoomRow) -> Result<Self, StoreError> {
        Ok(Room {
            id: row.id,
            number: row.number,
            zone: Zone::from_str(&row.zone).map_err(StoreError::Backend)?,
            quality: QualityTier::from_str(&row.quality).map_err(StoreError::Backend)?,
            status: RoomStatus::from_str(&row.status).map_err(StoreError::Backend)?,
            nightly_rate: row.nightly_rate,
        })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl RoomInventory for PgRoomInventory {
    async fn find_by_filter(
        &self,
        status: Option<RoomStatus>,
        zone: Option<Zone>,
        quality: Option<QualityTier>,
    ) -> Result<Vec<Room>, StoreError> {
        let rows = sqlx::query_as::<_, RoomRow>(
            r#"
            SELECT id, number, zone, quality, status, nightly_rate FROM rooms
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::TEXT IS NULL OR zone = $2)
              AND ($3::TEXT IS NULL OR quality = $3)
            ORDER BY number
            "#,
        )
        .bind(status.map(|s| s.to_string()))
        .bind(zone.map(|z| z.to_string()))
        .bind(quality.map(|q| q.to_string()))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Room::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Room>, StoreError> {
        let row = sqlx::query_as::<_, RoomRow>(
            "SELECT id, number, zone, quality, status, nightly_rate FROM rooms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Room::try_from).transpose()
    }
}
