//! Ride entity (database row mapping for the `rides` table).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct RideEntity {
    pub ride_id: Uuid,
    pub match_id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub status: String,
    pub total_cost_minor_units: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideEntity {
    pub fn into_domain(self) -> domain::models::Ride {
        domain::models::Ride {
            ride_id: self.ride_id,
            match_id: self.match_id,
            driver_id: self.driver_id,
            passenger_id: self.passenger_id,
            status: self.status.parse().unwrap_or(domain::models::RideStatus::Pending),
            total_cost_minor_units: self.total_cost_minor_units,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<RideEntity> for domain::models::Ride {
    fn from(entity: RideEntity) -> Self {
        entity.into_domain()
    }
}
