//! Shared utilities and common types for the ride-hailing core backend.
//!
//! This crate provides common functionality used across all four services
//! (users, match, location, rides):
//! - Cryptographic utilities (hashing, API-key/message-id derivation)
//! - JWT issuance/validation (RS256)
//! - Haversine distance
//! - Field validation helpers

pub mod crypto;
pub mod geo;
pub mod jwt;
pub mod validation;
