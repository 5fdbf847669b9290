//! User entity (database row mapping for the `users`/`drivers` tables).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub msisdn: String,
    pub fullname: String,
    pub role: String,
    pub is_active: bool,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserEntity {
    pub fn into_domain(self) -> domain::models::User {
        domain::models::User {
            id: self.id,
            msisdn: self.msisdn,
            fullname: self.fullname,
            role: self.role.parse().unwrap_or(domain::models::Role::Passenger),
            is_active: self.is_active,
            rating: self.rating,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        entity.into_domain()
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DriverEntity {
    pub user_id: Uuid,
    pub vehicle_type: String,
    pub vehicle_plate: String,
}

impl From<DriverEntity> for domain::models::Driver {
    fn from(entity: DriverEntity) -> Self {
        domain::models::Driver {
            user_id: entity.user_id,
            vehicle_type: entity.vehicle_type,
            vehicle_plate: entity.vehicle_plate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_defaults_to_passenger() {
        let entity = UserEntity {
            id: Uuid::new_v4(),
            msisdn: "+6281234567890".into(),
            fullname: "Test User".into(),
            role: "bogus".into(),
            is_active: true,
            rating: 5.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let user: domain::models::User = entity.into();
        assert_eq!(user.role, domain::models::Role::Passenger);
    }
}
