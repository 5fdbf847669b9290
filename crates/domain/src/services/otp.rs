//! OTP delivery seam (spec §1 names OTP generation/SMS delivery as an
//! external collaborator — this trait is the boundary, mirroring the
//! teacher's `NotificationService`/mock split for an out-of-scope channel).

use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
#[error("otp delivery failed: {0}")]
pub struct OtpSendError(pub String);

#[async_trait]
pub trait OtpSender: Send + Sync {
    async fn send(&self, msisdn: &str, code: &str) -> Result<(), OtpSendError>;
}

/// Logs the OTP instead of sending an SMS; the default for local runs.
#[derive(Debug, Clone, Default)]
pub struct ConsoleOtpSender;

#[async_trait]
impl OtpSender for ConsoleOtpSender {
    async fn send(&self, msisdn: &str, code: &str) -> Result<(), OtpSendError> {
        tracing::info!(%msisdn, %code, "console OTP sender: would send SMS");
        Ok(())
    }
}

/// Generates a 6-digit numeric OTP code.
pub fn generate_otp_code() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    format!("{:06}", rng.gen_range(0..1_000_000))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_code_is_six_digits() {
        let code = generate_otp_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn console_sender_succeeds() {
        let sender = ConsoleOtpSender;
        assert!(sender.send("+6281234567890", "123456").await.is_ok());
    }
}
