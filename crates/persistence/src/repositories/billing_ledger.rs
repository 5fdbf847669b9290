//! Billing ledger repository — append-only distance/cost segments (spec
//! §4.3 "Billing ledger").

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::BillingLedgerEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct BillingLedgerRepository {
    pool: PgPool,
}

impl BillingLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Appends a new segment entry; the ledger never updates or deletes
    /// rows (spec §4.3 invariant).
    pub async fn append(
        &self,
        ride_id: Uuid,
        distance_km: f64,
        cost_minor_units: i64,
    ) -> Result<BillingLedgerEntity, sqlx::Error> {
        let timer = QueryTimer::new("append_billing_ledger_entry");
        let entity = sqlx::query_as::<_, BillingLedgerEntity>(
            r#"
            INSERT INTO billing_ledger (entry_id, ride_id, distance_km, cost_minor_units)
            VALUES (gen_random_uuid(), $1, $2, $3)
            RETURNING entry_id, ride_id, distance_km, cost_minor_units, created_at
            "#,
        )
        .bind(ride_id)
        .bind(distance_km)
        .bind(cost_minor_units)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        entity
    }

    pub async fn list_for_ride(&self, ride_id: Uuid) -> Result<Vec<BillingLedgerEntity>, sqlx::Error> {
        sqlx::query_as::<_, BillingLedgerEntity>(
            "SELECT entry_id, ride_id, distance_km, cost_minor_units, created_at FROM billing_ledger WHERE ride_id = $1 ORDER BY created_at ASC",
        )
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Sums the ledger for a ride — used to reconcile against
    /// `rides.total_cost_minor_units` at settlement time.
    pub async fn sum_cost_for_ride(&self, ride_id: Uuid) -> Result<i64, sqlx::Error> {
        let sum: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(cost_minor_units) FROM billing_ledger WHERE ride_id = $1",
        )
        .bind(ride_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(sum.unwrap_or(0))
    }
}
