//! Match proposal repository — the confirmation protocol's row-locked
//! transaction lives here (spec §4.1 "Confirmation protocol").

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::MatchEntity;
use crate::metrics::QueryTimer;
use domain::models::{apply_confirmation, apply_rejection, ConfirmError, MatchStatus};

#[derive(Debug, Clone)]
pub struct NewMatch {
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub driver_lat: f64,
    pub driver_lng: f64,
    pub passenger_lat: f64,
    pub passenger_lng: f64,
    pub target_lat: f64,
    pub target_lng: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchRepoError {
    #[error("match not found")]
    NotFound,
    #[error(transparent)]
    Confirm(#[from] ConfirmError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct MatchRepository {
    pool: PgPool,
}

impl MatchRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates a PENDING proposal, or reuses the existing PENDING proposal
    /// for this `(driver_id, passenger_id)` pair (spec §4.1 step 3
    /// "uniqueness guard"). A partial unique index on
    /// `(driver_id, passenger_id) WHERE status = 'PENDING'` backs this.
    pub async fn create_or_reuse_pending(&self, input: NewMatch) -> Result<MatchEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_or_reuse_pending_match");

        sqlx::query(
            r#"
            INSERT INTO matches (
                id, driver_id, passenger_id,
                driver_latitude, driver_longitude,
                passenger_latitude, passenger_longitude,
                target_latitude, target_longitude,
                status, driver_confirmed, passenger_confirmed
            )
            VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, 'PENDING', false, false)
            ON CONFLICT (driver_id, passenger_id) WHERE status = 'PENDING' DO NOTHING
            "#,
        )
        .bind(input.driver_id)
        .bind(input.passenger_id)
        .bind(input.driver_lat)
        .bind(input.driver_lng)
        .bind(input.passenger_lat)
        .bind(input.passenger_lng)
        .bind(input.target_lat)
        .bind(input.target_lng)
        .execute(&self.pool)
        .await?;

        let entity = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT id, driver_id, passenger_id,
                   driver_latitude, driver_longitude,
                   passenger_latitude, passenger_longitude,
                   target_latitude, target_longitude,
                   status, driver_confirmed, passenger_confirmed,
                   created_at, updated_at
            FROM matches
            WHERE driver_id = $1 AND passenger_id = $2 AND status = 'PENDING'
            "#,
        )
        .bind(input.driver_id)
        .bind(input.passenger_id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        entity
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MatchEntity>, sqlx::Error> {
        sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT id, driver_id, passenger_id,
                   driver_latitude, driver_longitude,
                   passenger_latitude, passenger_longitude,
                   target_latitude, target_longitude,
                   status, driver_confirmed, passenger_confirmed,
                   created_at, updated_at
            FROM matches WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Runs the two-sided confirmation protocol under `SELECT ... FOR
    /// UPDATE`, linearizing concurrent confirmations on the same proposal
    /// (spec §4.1, §5). Returns the post-transition entity; the caller
    /// (match-svc) is responsible for the post-commit availability-pool
    /// removal / active-ride-lock insert and the `match.accepted` publish.
    pub async fn confirm(
        &self,
        match_id: Uuid,
        confirming_user_id: Uuid,
        is_driver: bool,
    ) -> Result<MatchEntity, MatchRepoError> {
        let timer = QueryTimer::new("confirm_match");
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MatchEntity>(
            r#"
            SELECT id, driver_id, passenger_id,
                   driver_latitude, driver_longitude,
                   passenger_latitude, passenger_longitude,
                   target_latitude, target_longitude,
                   status, driver_confirmed, passenger_confirmed,
                   created_at, updated_at
            FROM matches WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MatchRepoError::NotFound)?;

        let proposal = row.clone().into_domain();
        let (new_status, driver_confirmed, passenger_confirmed) =
            apply_confirmation(&proposal, confirming_user_id, is_driver)?;

        let updated = sqlx::query_as::<_, MatchEntity>(
            r#"
            UPDATE matches
            SET status = $2, driver_confirmed = $3, passenger_confirmed = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, driver_id, passenger_id,
                      driver_latitude, driver_longitude,
                      passenger_latitude, passenger_longitude,
                      target_latitude, target_longitude,
                      status, driver_confirmed, passenger_confirmed,
                      created_at, updated_at
            "#,
        )
        .bind(match_id)
        .bind(new_status.to_string())
        .bind(driver_confirmed)
        .bind(passenger_confirmed)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }

    /// Direct rejection path; a second rejection after REJECTED is a no-op
    /// success (spec §4.1).
    pub async fn reject(&self, match_id: Uuid) -> Result<MatchEntity, MatchRepoError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, MatchEntity>(
            "SELECT id, driver_id, passenger_id, driver_latitude, driver_longitude, passenger_latitude, passenger_longitude, target_latitude, target_longitude, status, driver_confirmed, passenger_confirmed, created_at, updated_at FROM matches WHERE id = $1 FOR UPDATE",
        )
        .bind(match_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MatchRepoError::NotFound)?;

        let proposal = row.clone().into_domain();
        let new_status = apply_rejection(&proposal);

        let updated = sqlx::query_as::<_, MatchEntity>(
            "UPDATE matches SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING id, driver_id, passenger_id, driver_latitude, driver_longitude, passenger_latitude, passenger_longitude, target_latitude, target_longitude, status, driver_confirmed, passenger_confirmed, created_at, updated_at",
        )
        .bind(match_id)
        .bind(new_status.to_string())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Cleanup path: mark sibling proposals REJECTED, restricted by a SQL
    /// guard to non-terminal rows only (spec §4.1 "Batch status update").
    pub async fn batch_mark_rejected(&self, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE matches
            SET status = 'REJECTED', updated_at = NOW()
            WHERE id = ANY($1) AND status NOT IN ('ACCEPTED', 'REJECTED')
            "#,
        )
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

impl From<MatchStatus> for String {
    fn from(status: MatchStatus) -> Self {
        status.to_string()
    }
}
