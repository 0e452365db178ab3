use async_trait::async_trait;
use capsule_core::{Hold, HoldRepository, HoldStage, StayRange, StoreError};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

const HOLD_COLUMNS: &str = "id, room_id, check_in, check_out, session_id, user_id, stage, \
     expires_at, converted, reservation_id, created_at";

pub struct PgHoldRepository {
    pool: PgPool,
}

impl PgHoldRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct HoldRow {
    id: Uuid,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    session_id: String,
    user_id: Option<Uuid>,
    stage: String,
    expires_at: DateTime<Utc>,
    converted: bool,
    reservation_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl TryFrom<HoldRow> for Hold {
    type Error = StoreError;

    fn try_from(row: HoldRow) -> Result<Self, StoreError> {
        Ok(Hold {
            id: row.id,
            room_id: row.room_id,
            stay: StayRange::new(row.check_in, row.check_out)
                .map_err(|e| StoreError::Backend(e.to_string()))?,
            session_id: row.session_id,
            user_id: row.user_id,
            stage: HoldStage::from_str(&row.stage).map_err(StoreError::Backend)?,
            expires_at: row.expires_at,
            converted: row.converted,
            reservation_id: row.reservation_id,
            created_at: row.created_at,
        })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn rows_to_holds(rows: Vec<HoldRow>) -> Result<Vec<Hold>, StoreError> {
    rows.into_iter().map(Hold::try_from).collect()
}

#[async_trait]
impl HoldRepository for PgHoldRepository {
    async fn insert(&self, hold: &Hold) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO holds (id, room_id, check_in, check_out, session_id, user_id, stage,
                               expires_at, converted, reservation_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(hold.id)
        .bind(hold.room_id)
        .bind(hold.stay.check_in)
        .bind(hold.stay.check_out)
        .bind(&hold.session_id)
        .bind(hold.user_id)
        .bind(hold.stage.to_string())
        .bind(hold.expires_at)
        .bind(hold.converted)
        .bind(hold.reservation_id)
        .bind(hold.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Hold>, StoreError> {
        let row = sqlx::query_as::<_, HoldRow>(&format!(
            "SELECT {HOLD_COLUMNS} FROM holds WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(Hold::try_from).transpose()
    }

    async fn save(&self, hold: &Hold) -> Result<bool, StoreError> {
        // Room, stay and session are immutable after creation; only the
        // lifecycle fields are written back.
        let result = sqlx::query(
            r#"
            UPDATE holds
            SET stage = $2, expires_at = $3, converted = $4, reservation_id = $5
            WHERE id = $1
            "#,
        )
        .bind(hold.id)
        .bind(hold.stage.to_string())
        .bind(hold.expires_at)
        .bind(hold.converted)
        .bind(hold.reservation_id)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_active_overlapping(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        now: DateTime<Utc>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<Hold>, StoreError> {
        let rows = sqlx::query_as::<_, HoldRow>(&format!(
            r#"
            SELECT {HOLD_COLUMNS} FROM holds
            WHERE room_id = $1
              AND converted = FALSE
              AND expires_at > $2
              AND check_in < $3 AND check_out > $4
              AND ($5::TEXT IS NULL OR session_id <> $5)
            "#
        ))
        .bind(room_id)
        .bind(now)
        .bind(stay.check_out)
        .bind(stay.check_in)
        .bind(exclude_session)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows_to_holds(rows)
    }

    async fn find_contending(
        &self,
        stay: &StayRange,
        now: DateTime<Utc>,
        exclude_session: Option<&str>,
    ) -> Result<Vec<Hold>, StoreError> {
        let rows = sqlx::query_as::<_, HoldRow>(&format!(
            r#"
            SELECT {HOLD_COLUMNS} FROM holds
            WHERE converted = FALSE
              AND expires_at > $1
              AND check_in < $2 AND check_out > $3
              AND ($4::TEXT IS NULL OR session_id <> $4)
            "#
        ))
        .bind(now)
        .bind(stay.check_out)
        .bind(stay.check_in)
        .bind(exclude_session)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows_to_holds(rows)
    }

    async fn find_by_session(
        &self,
        session_id: &str,
        active_only: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Hold>, StoreError> {
        let rows = sqlx::query_as::<_, HoldRow>(&format!(
            r#"
            SELECT {HOLD_COLUMNS} FROM holds
            WHERE session_id = $1
              AND ($2 = FALSE OR (converted = FALSE AND expires_at > $3))
            ORDER BY created_at
            "#
        ))
        .bind(session_id)
        .bind(active_only)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows_to_holds(rows)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM holds WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_session(&self, session_id: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM holds WHERE session_id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM holds WHERE expires_at < $1 AND converted = FALSE")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        let purged = result.rows_affected();
        if purged > 0 {
            debug!(purged, "purged expired holds");
        }
        Ok(purged)
    }
}
