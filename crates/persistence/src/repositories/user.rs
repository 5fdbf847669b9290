//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{DriverEntity, UserEntity};
use crate::metrics::QueryTimer;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub msisdn: String,
    pub fullname: String,
    pub role: String,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates a user on OTP verification, or returns the existing row for
    /// this `msisdn` (spec §3 "created at OTP verification").
    pub async fn find_or_create(&self, input: NewUser) -> Result<UserEntity, sqlx::Error> {
        let timer = QueryTimer::new("find_or_create_user");

        sqlx::query(
            r#"
            INSERT INTO users (id, msisdn, fullname, role, is_active, rating)
            VALUES (gen_random_uuid(), $1, $2, $3, true, 5.0)
            ON CONFLICT (msisdn) DO NOTHING
            "#,
        )
        .bind(&input.msisdn)
        .bind(&input.fullname)
        .bind(&input.role)
        .execute(&self.pool)
        .await?;

        let entity = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, msisdn, fullname, role, is_active, rating, created_at, updated_at
            FROM users WHERE msisdn = $1
            "#,
        )
        .bind(&input.msisdn)
        .fetch_one(&self.pool)
        .await;

        timer.record();
        entity
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, msisdn, fullname, role, is_active, rating, created_at, updated_at
            FROM users WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Additive role upgrade (passenger -> driver): attaches a `Driver`
    /// sub-record without a new OTP cycle (spec §4.5, SPEC_FULL.md).
    pub async fn upgrade_to_driver(
        &self,
        user_id: Uuid,
        vehicle_type: &str,
        vehicle_plate: &str,
    ) -> Result<DriverEntity, sqlx::Error> {
        let timer = QueryTimer::new("upgrade_to_driver");
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE users SET role = 'driver', updated_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let driver = sqlx::query_as::<_, DriverEntity>(
            r#"
            INSERT INTO drivers (user_id, vehicle_type, vehicle_plate)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE SET vehicle_type = $2, vehicle_plate = $3
            RETURNING user_id, vehicle_type, vehicle_plate
            "#,
        )
        .bind(user_id)
        .bind(vehicle_type)
        .bind(vehicle_plate)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(driver)
    }

    pub async fn find_driver(&self, user_id: Uuid) -> Result<Option<DriverEntity>, sqlx::Error> {
        sqlx::query_as::<_, DriverEntity>(
            "SELECT user_id, vehicle_type, vehicle_plate FROM drivers WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }
}
