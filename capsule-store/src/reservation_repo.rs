use async_trait::async_trait;
use capsule_core::{
    NewReservation, Reservation, ReservationStatus, ReservationStore, StayRange, StoreError,
};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::str::FromStr;
use uuid::Uuid;

// Postgres error code raised by the reservations_no_overlap exclusion
// constraint (exclusion_violation).
const EXCLUSION_VIOLATION: &str = "23P01";

pub struct PgReservationStore {
    pool: PgPool,
}

impl PgReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal struct for type-safe querying
#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    room_id: Uuid,
    check_in: NaiveDate,
    check_out: NaiveDate,
    status: String,
}

impl TryFrom<ReservationRow> for Reservation {
    type Error = StoreError;

    fn try_from(row: ReservationRow) -> Result<Self, StoreError> {
        Ok(Reservation {
            id: row.id,
            room_id: row.room_id,
            stay: StayRange::new(row.check_in, row.check_out)
                .map_err(|e| StoreError::Backend(e.to_string()))?,
            status: ReservationStatus::from_str(&row.status).map_err(StoreError::Backend)?,
        })
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn find_overlapping(
        &self,
        room_id: Uuid,
        stay: &StayRange,
        exclude_reservation: Option<Uuid>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, room_id, check_in, check_out, status FROM reservations
            WHERE room_id = $1
              AND status <> 'CANCELLED'
              AND check_in < $2 AND check_out > $3
              AND ($4::UUID IS NULL OR id <> $4)
            "#,
        )
        .bind(room_id)
        .bind(stay.check_out)
        .bind(stay.check_in)
        .bind(exclude_reservation)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn find_overlapping_any(&self, stay: &StayRange) -> Result<Vec<Reservation>, StoreError> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            r#"
            SELECT id, room_id, check_in, check_out, status FROM reservations
            WHERE status <> 'CANCELLED'
              AND check_in < $1 AND check_out > $2
            "#,
        )
        .bind(stay.check_out)
        .bind(stay.check_in)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(Reservation::try_from).collect()
    }

    async fn create(&self, new: NewReservation) -> Result<Reservation, StoreError> {
        let reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: new.room_id,
            stay: new.stay,
            status: new.status,
        };

        // The exclusion constraint re-validates non-overlap atomically at
        // insert time; a racing commit loses with 23P01.
        sqlx::query(
            r#"
            INSERT INTO reservations (id, room_id, check_in, check_out, status)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(reservation.id)
        .bind(reservation.room_id)
        .bind(reservation.stay.check_in)
        .bind(reservation.stay.check_out)
        .bind(reservation.status.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some(EXCLUSION_VIOLATION) => {
                StoreError::Conflict {
                    room_id: new.room_id,
                }
            }
            _ => backend(e),
        })?;

        Ok(reservation)
    }
}
