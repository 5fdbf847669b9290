//! Billing ledger domain model (spec §3 "BillingLedgerEntry", §4.2
//! "Billing aggregation").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingLedgerEntry {
    pub entry_id: Uuid,
    pub ride_id: Uuid,
    pub distance_km: f64,
    pub cost_minor_units: i64,
    pub created_at: DateTime<Utc>,
}

/// The cost for one billed segment, or zero (but still recorded, per spec
/// §3 "for auditability") when the segment is below `min_distance_km`.
///
/// `cost_minor_units = round(distance_km * rate_per_km)` (spec §4.2 step 3).
pub fn segment_cost_minor_units(distance_km: f64, min_distance_km: f64, rate_per_km: f64) -> i64 {
    if distance_km < min_distance_km {
        return 0;
    }
    (distance_km * rate_per_km).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_zero_cost() {
        assert_eq!(segment_cost_minor_units(0.005, 0.01, 3000.0), 0);
    }

    #[test]
    fn at_or_above_threshold_is_billed() {
        // 1.453 km * 3000/km ~= 4359
        let cost = segment_cost_minor_units(1.453, 0.01, 3000.0);
        assert_eq!(cost, 4359);
    }

    #[test]
    fn zero_distance_is_zero_cost() {
        assert_eq!(segment_cost_minor_units(0.0, 0.01, 3000.0), 0);
    }
}
