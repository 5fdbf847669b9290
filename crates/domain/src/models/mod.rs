//! Domain models for the ride-hailing core (spec §3 "Data model").

pub mod availability;
pub mod billing;
pub mod match_proposal;
pub mod payment;
pub mod ride;
pub mod user;

pub use availability::{AvailabilityEntry, NearbyCandidate};
pub use billing::{segment_cost_minor_units, BillingLedgerEntry};
pub use match_proposal::{apply_confirmation, apply_rejection, ConfirmError, MatchProposal, MatchStatus};
pub use payment::{settle, Payment, PaymentStatus, Settlement};
pub use ride::{next_status, Ride, RideEvent, RideStatus};
pub use user::{Driver, Role, User};
