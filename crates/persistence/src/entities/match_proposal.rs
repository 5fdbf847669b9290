//! MatchProposal entity (database row mapping for the `matches` table).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct MatchEntity {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub passenger_id: Uuid,
    pub driver_latitude: f64,
    pub driver_longitude: f64,
    pub passenger_latitude: f64,
    pub passenger_longitude: f64,
    pub target_latitude: f64,
    pub target_longitude: f64,
    pub status: String,
    pub driver_confirmed: bool,
    pub passenger_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchEntity {
    pub fn into_domain(self) -> domain::models::MatchProposal {
        use shared::geo::GeoPoint;

        domain::models::MatchProposal {
            id: self.id,
            driver_id: self.driver_id,
            passenger_id: self.passenger_id,
            driver_location: GeoPoint::new(self.driver_latitude, self.driver_longitude),
            passenger_location: GeoPoint::new(self.passenger_latitude, self.passenger_longitude),
            target_location: GeoPoint::new(self.target_latitude, self.target_longitude),
            status: self.status.parse().unwrap_or(domain::models::MatchStatus::Pending),
            driver_confirmed: self.driver_confirmed,
            passenger_confirmed: self.passenger_confirmed,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<MatchEntity> for domain::models::MatchProposal {
    fn from(entity: MatchEntity) -> Self {
        entity.into_domain()
    }
}
