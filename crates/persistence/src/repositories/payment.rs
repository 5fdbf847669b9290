//! Payment repository (spec §4.4 "Settlement").

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::PaymentEntity;
use crate::metrics::QueryTimer;

#[derive(Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Inserts the settlement as PENDING; idempotent per ride (a
    /// redelivered `ride.completed` must not double-settle).
    pub async fn create_pending(
        &self,
        ride_id: Uuid,
        adjusted_cost: i64,
        admin_fee: i64,
        driver_payout: i64,
    ) -> Result<PaymentEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_pending_payment");

        sqlx::query(
            r#"
            INSERT INTO payments (payment_id, ride_id, adjusted_cost, admin_fee, driver_payout, status)
            VALUES (gen_random_uuid(), $1, $2, $3, $4, 'PENDING')
            ON CONFLICT (ride_id) DO NOTHING
            "#,
        )
        .bind(ride_id)
        .bind(adjusted_cost)
        .bind(admin_fee)
        .bind(driver_payout)
        .execute(&self.pool)
        .await?;

        let entity = sqlx::query_as::<_, PaymentEntity>(
            "SELECT payment_id, ride_id, adjusted_cost, admin_fee, driver_payout, status, created_at FROM payments WHERE ride_id = $1",
        )
        .bind(ride_id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        entity
    }

    pub async fn find_by_ride_id(&self, ride_id: Uuid) -> Result<Option<PaymentEntity>, sqlx::Error> {
        sqlx::query_as::<_, PaymentEntity>(
            "SELECT payment_id, ride_id, adjusted_cost, admin_fee, driver_payout, status, created_at FROM payments WHERE ride_id = $1",
        )
        .bind(ride_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// `ProcessPayment(ride_id, status)` (spec §4.2): a driver/admin decision
    /// of ACCEPTED finalizes the payment as PROCESSED; REJECTED leaves it
    /// REJECTED. Restricted to PENDING rows so a second call against an
    /// already-decided payment is a no-op that returns the existing row
    /// rather than re-applying the transition (idempotent under bus
    /// redelivery, spec §8 "at-least-once consumer idempotence"). The bool
    /// signals whether this call was the one that actually applied the
    /// transition, so the caller can publish `ride.completed` exactly once.
    pub async fn process(
        &self,
        ride_id: Uuid,
        decision: domain::models::PaymentStatus,
    ) -> Result<(PaymentEntity, bool), sqlx::Error> {
        let timer = QueryTimer::new("process_payment");

        let final_status = match decision {
            domain::models::PaymentStatus::Accepted => domain::models::PaymentStatus::Processed,
            other => other,
        };

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = $2
            WHERE ride_id = $1 AND status = 'PENDING'
            "#,
        )
        .bind(ride_id)
        .bind(final_status.to_string())
        .execute(&self.pool)
        .await?;

        let entity = sqlx::query_as::<_, PaymentEntity>(
            "SELECT payment_id, ride_id, adjusted_cost, admin_fee, driver_payout, status, created_at FROM payments WHERE ride_id = $1",
        )
        .bind(ride_id)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        entity.map(|e| (e, result.rows_affected() > 0))
    }
}
