//! Payment domain model and settlement math (spec §3 "Payment", §4.2
//! "Arrival & settlement").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Accepted,
    Rejected,
    Processed,
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "ACCEPTED" => Ok(PaymentStatus::Accepted),
            "REJECTED" => Ok(PaymentStatus::Rejected),
            "PROCESSED" => Ok(PaymentStatus::Processed),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Accepted => "ACCEPTED",
            PaymentStatus::Rejected => "REJECTED",
            PaymentStatus::Processed => "PROCESSED",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: Uuid,
    pub ride_id: Uuid,
    pub adjusted_cost: i64,
    pub admin_fee: i64,
    pub driver_payout: i64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// The three derived settlement figures for a ride arrival (spec §3, §4.2):
/// `adjusted_cost = round(sum(ledger.cost) * adjustment_factor)`,
/// `admin_fee = round(adjusted_cost * admin_fee_percent)`,
/// `driver_payout = adjusted_cost - admin_fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub adjusted_cost: i64,
    pub admin_fee: i64,
    pub driver_payout: i64,
}

pub fn settle(total_cost_minor_units: i64, adjustment_factor: f64, admin_fee_percent: f64) -> Settlement {
    let adjusted_cost = (total_cost_minor_units as f64 * adjustment_factor).round() as i64;
    let admin_fee = (adjusted_cost as f64 * admin_fee_percent).round() as i64;
    let driver_payout = adjusted_cost - admin_fee;

    Settlement {
        adjusted_cost,
        admin_fee,
        driver_payout,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_seed_scenario_three() {
        // spec scenario 3: ledger sum 12000, adjustment_factor=0.9, admin_fee_percent=0.05
        let s = settle(12000, 0.9, 0.05);
        assert_eq!(s.adjusted_cost, 10800);
        assert_eq!(s.admin_fee, 540);
        assert_eq!(s.driver_payout, 10260);
    }

    #[test]
    fn payout_plus_fee_equals_adjusted_cost() {
        let s = settle(9973, 0.87, 0.12);
        assert_eq!(s.driver_payout + s.admin_fee, s.adjusted_cost);
    }
}
