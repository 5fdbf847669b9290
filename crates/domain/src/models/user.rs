//! User and driver domain models (spec §3 "User").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's role. Drivers and passengers share the same `users` table;
/// the role enum selects which parallel operation applies (spec §9
/// "Polymorphism / role split").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Driver,
    Passenger,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Driver => "driver",
            Role::Passenger => "passenger",
        }
    }

    pub fn other(&self) -> Role {
        match self {
            Role::Driver => Role::Passenger,
            Role::Passenger => Role::Driver,
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "driver" => Ok(Role::Driver),
            "passenger" => Ok(Role::Passenger),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Created at OTP verification, immutable thereafter except role upgrade
/// (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub msisdn: String,
    pub fullname: String,
    pub role: Role,
    pub is_active: bool,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attached to a `User` row when its role is (or is upgraded to) driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub user_id: Uuid,
    pub vehicle_type: String,
    pub vehicle_plate: String,
}
