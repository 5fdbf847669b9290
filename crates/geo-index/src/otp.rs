//! OTP code storage (spec §6 key/value namespace `otp:{msisdn}`). OTP
//! generation and SMS delivery themselves are out of scope (spec §1); this
//! is just the short-lived code cache users-svc checks against on verify.

use redis::AsyncCommands;

use crate::{GeoIndex, GeoIndexError};

fn otp_key(msisdn: &str) -> String {
    format!("otp:{msisdn}")
}

impl GeoIndex {
    pub async fn store_otp(&self, msisdn: &str, code: &str, ttl_secs: u64) -> Result<(), GeoIndexError> {
        let mut conn = self.conn().await?;
        let _: () = conn.set_ex(otp_key(msisdn), code, ttl_secs).await?;
        Ok(())
    }

    /// Verifies the stored code and consumes it on success — a code is
    /// single-use regardless of whether it matched, so a leaked code can't
    /// be replayed after a correct verify.
    pub async fn verify_and_consume_otp(&self, msisdn: &str, code: &str) -> Result<bool, GeoIndexError> {
        let mut conn = self.conn().await?;
        let stored: Option<String> = conn.get(otp_key(msisdn)).await?;
        let matched = stored.as_deref() == Some(code);
        if matched {
            let _: () = conn.del(otp_key(msisdn)).await?;
        }
        Ok(matched)
    }
}
