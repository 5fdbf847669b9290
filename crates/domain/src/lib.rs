//! Domain layer for the ride-hailing core backend.
//!
//! Pure, I/O-free models and business rules shared by all four services:
//! - Domain models (`User`, `Driver`, `AvailabilityEntry`, `MatchProposal`,
//!   `Ride`, `BillingLedgerEntry`, `Payment`)
//! - Domain services (matching state machine, billing math, notification
//!   fan-out trait, OTP delivery trait)

pub mod models;
pub mod services;
