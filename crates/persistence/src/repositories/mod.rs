//! Repository implementations for database operations.

pub mod billing_ledger;
pub mod idempotency_key;
pub mod match_proposal;
pub mod payment;
pub mod ride;
pub mod user;

pub use billing_ledger::BillingLedgerRepository;
pub use idempotency_key::IdempotencyKeyRepository;
pub use match_proposal::{MatchRepoError, MatchRepository, NewMatch};
pub use payment::PaymentRepository;
pub use ride::{RideRepoError, RideRepository};
pub use user::{NewUser, UserRepository};
