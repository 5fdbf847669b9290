//! Persistence layer for the ride-hailing core backend.
//!
//! This crate contains:
//! - Database connection management (`db`)
//! - Entity definitions (database row mappings, `entities`)
//! - Repository implementations (`repositories`) — one per durable
//!   aggregate from spec §3: users/drivers, matches, rides, billing
//!   ledger, payments, plus idempotency-key tracking for HTTP POSTs that
//!   create durable state.
//!
//! Migration DDL is explicitly out of scope (spec §1 Non-goals); the
//! schema these repositories assume is documented in DESIGN.md.

pub mod db;
pub mod entities;
pub mod repositories;
