//! Ride repository — lifecycle transitions and the running cost counter
//! (spec §3 "Ride", §4.2 "Ride lifecycle").

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RideEntity;
use crate::metrics::QueryTimer;

#[derive(Debug, thiserror::Error)]
pub enum RideRepoError {
    #[error("ride not found")]
    NotFound,
    #[error("illegal ride state transition")]
    InvalidTransition,
    #[error("ride is not in a billable state")]
    NotBillable,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the ride for an accepted match under the `ride_id` match-svc
    /// minted at confirmation time (spec §4.1 "insert the active-ride-lock
    /// pair" happens before this row exists, so the id has to be chosen
    /// upstream), or returns the existing row if a `match.accepted` event is
    /// redelivered (spec §4.2 "idempotent by match_id"). The bool signals
    /// whether this call was the one that actually inserted the row, so the
    /// caller can publish `ride.pickup` exactly once (spec §4.2 "Creation" /
    /// §8 "at-least-once consumer idempotence").
    pub async fn create_for_match(
        &self,
        ride_id: Uuid,
        match_id: Uuid,
        driver_id: Uuid,
        passenger_id: Uuid,
    ) -> Result<(RideEntity, bool), sqlx::Error> {
        let timer = QueryTimer::new("create_ride_for_match");

        let insert_result = sqlx::query(
            r#"
            INSERT INTO rides (ride_id, match_id, driver_id, passenger_id, status, total_cost_minor_units)
            VALUES ($1, $2, $3, $4, 'PENDING', 0)
            ON CONFLICT (match_id) DO NOTHING
            "#,
        )
        .bind(ride_id)
        .bind(match_id)
        .bind(driver_id)
        .bind(passenger_id)
        .execute(&self.pool)
        .await?;

        let entity = sqlx::query_as::<_, RideEntity>(
            r#"
            SELECT ride_id, match_id, driver_id, passenger_id, status, total_cost_minor_units, created_at, updated_at
            FROM rides WHERE match_id = $1
            "#,
        )
        .bind(match_id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        entity.map(|e| (e, insert_result.rows_affected() > 0))
    }

    pub async fn find_by_id(&self, ride_id: Uuid) -> Result<Option<RideEntity>, sqlx::Error> {
        sqlx::query_as::<_, RideEntity>(
            "SELECT ride_id, match_id, driver_id, passenger_id, status, total_cost_minor_units, created_at, updated_at FROM rides WHERE ride_id = $1",
        )
        .bind(ride_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Applies a lifecycle transition under row lock, validated against
    /// `domain::next_status` before commit.
    pub async fn apply_transition(
        &self,
        ride_id: Uuid,
        event: domain::models::RideEvent,
    ) -> Result<RideEntity, RideRepoError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RideEntity>(
            "SELECT ride_id, match_id, driver_id, passenger_id, status, total_cost_minor_units, created_at, updated_at FROM rides WHERE ride_id = $1 FOR UPDATE",
        )
        .bind(ride_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RideRepoError::NotFound)?;

        let current: domain::models::RideStatus = row
            .status
            .parse()
            .unwrap_or(domain::models::RideStatus::Pending);
        let next = domain::models::next_status(current, event).ok_or(RideRepoError::InvalidTransition)?;

        let updated = sqlx::query_as::<_, RideEntity>(
            r#"
            UPDATE rides SET status = $2, updated_at = NOW() WHERE ride_id = $1
            RETURNING ride_id, match_id, driver_id, passenger_id, status, total_cost_minor_units, created_at, updated_at
            "#,
        )
        .bind(ride_id)
        .bind(next.to_string())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// `ProcessBillingUpdate` (spec §4.2): appends the ledger row and, if
    /// billable, increments `total_cost_minor_units` in the same
    /// transaction under the ride row lock, so concurrent billing
    /// consumers for the same ride never lose an update (spec §4.2 step 4,
    /// §5 "Within a single ride, the ride-row lock serializes billing
    /// increments against the arrival transition"). `cost_minor_units` of
    /// zero (sub-`min_distance_km` segment) still appends a row but skips
    /// the total update (spec §4.2 step 2).
    pub async fn record_billing_segment(
        &self,
        ride_id: Uuid,
        distance_km: f64,
        cost_minor_units: i64,
    ) -> Result<RideEntity, RideRepoError> {
        let timer = QueryTimer::new("record_billing_segment");
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RideEntity>(
            "SELECT ride_id, match_id, driver_id, passenger_id, status, total_cost_minor_units, created_at, updated_at FROM rides WHERE ride_id = $1 FOR UPDATE",
        )
        .bind(ride_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RideRepoError::NotFound)?;

        let status: domain::models::RideStatus = row.status.parse().unwrap_or(domain::models::RideStatus::Pending);
        if status != domain::models::RideStatus::Ongoing {
            return Err(RideRepoError::NotBillable);
        }

        sqlx::query(
            r#"
            INSERT INTO billing_ledger (entry_id, ride_id, distance_km, cost_minor_units)
            VALUES (gen_random_uuid(), $1, $2, $3)
            "#,
        )
        .bind(ride_id)
        .bind(distance_km)
        .bind(cost_minor_units)
        .execute(&mut *tx)
        .await?;

        let updated = if cost_minor_units > 0 {
            sqlx::query_as::<_, RideEntity>(
                r#"
                UPDATE rides
                SET total_cost_minor_units = total_cost_minor_units + $2, updated_at = NOW()
                WHERE ride_id = $1
                RETURNING ride_id, match_id, driver_id, passenger_id, status, total_cost_minor_units, created_at, updated_at
                "#,
            )
            .bind(ride_id)
            .bind(cost_minor_units)
            .fetch_one(&mut *tx)
            .await?
        } else {
            row
        };

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }
}
