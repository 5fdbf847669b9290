//! OTP request/verify orchestration (spec §4.5 "RequestOtp"/"VerifyOtp"):
//! generates a code, stores it in the ephemeral index with a TTL, and hands
//! delivery off to an `OtpSender` (console logger locally, swappable for a
//! real SMS gateway the way the teacher swaps `NotificationService`).

use std::sync::Arc;

use domain::services::{generate_otp_code, OtpSendError, OtpSender};
use geo_index::GeoIndex;

#[derive(Debug, thiserror::Error)]
pub enum OtpServiceError {
    #[error(transparent)]
    GeoIndex(#[from] geo_index::GeoIndexError),
    #[error(transparent)]
    Send(#[from] OtpSendError),
}

/// Holds its sender as a trait object so it can sit in `AppState` (a single
/// concrete `Router` state type) regardless of which `OtpSender` impl was
/// wired at startup.
#[derive(Clone)]
pub struct OtpService {
    geo: GeoIndex,
    sender: Arc<dyn OtpSender>,
    ttl_secs: u64,
}

impl OtpService {
    pub fn new(geo: GeoIndex, sender: Arc<dyn OtpSender>, ttl_secs: u64) -> Self {
        Self { geo, sender, ttl_secs }
    }

    pub async fn request(&self, msisdn: &str) -> Result<(), OtpServiceError> {
        let code = generate_otp_code();
        self.geo.store_otp(msisdn, &code, self.ttl_secs).await?;
        self.sender.send(msisdn, &code).await?;
        Ok(())
    }

    /// Single-use verification: a code that matches is consumed even if it
    /// hasn't expired yet, so it cannot be replayed (spec §4.5 "VerifyOtp").
    pub async fn verify(&self, msisdn: &str, code: &str) -> Result<bool, OtpServiceError> {
        Ok(self.geo.verify_and_consume_otp(msisdn, code).await?)
    }
}
