//! Billing ledger entity (database row mapping for the append-only
//! `billing_ledger` table).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct BillingLedgerEntity {
    pub entry_id: Uuid,
    pub ride_id: Uuid,
    pub distance_km: f64,
    pub cost_minor_units: i64,
    pub created_at: DateTime<Utc>,
}

impl From<BillingLedgerEntity> for domain::models::BillingLedgerEntry {
    fn from(entity: BillingLedgerEntity) -> Self {
        domain::models::BillingLedgerEntry {
            entry_id: entity.entry_id,
            ride_id: entity.ride_id,
            distance_km: entity.distance_km,
            cost_minor_units: entity.cost_minor_units,
            created_at: entity.created_at,
        }
    }
}
