//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod billing_ledger;
pub mod idempotency_key;
pub mod match_proposal;
pub mod payment;
pub mod ride;
pub mod user;

pub use billing_ledger::BillingLedgerEntity;
pub use idempotency_key::IdempotencyKeyEntity;
pub use match_proposal::MatchEntity;
pub use payment::PaymentEntity;
pub use ride::RideEntity;
pub use user::{DriverEntity, UserEntity};
