//! Payment entity (database row mapping for the `payments` table).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct PaymentEntity {
    pub payment_id: Uuid,
    pub ride_id: Uuid,
    pub adjusted_cost: i64,
    pub admin_fee: i64,
    pub driver_payout: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentEntity> for domain::models::Payment {
    fn from(entity: PaymentEntity) -> Self {
        domain::models::Payment {
            payment_id: entity.payment_id,
            ride_id: entity.ride_id,
            adjusted_cost: entity.adjusted_cost,
            admin_fee: entity.admin_fee,
            driver_payout: entity.driver_payout,
            status: entity.status.parse().unwrap_or(domain::models::PaymentStatus::Pending),
            created_at: entity.created_at,
        }
    }
}
