//! Domain services: business logic that operates on domain models without
//! I/O, kept separate from the HTTP/bus layer (teacher's
//! `domain::services::{policy_resolution, notification}` split).

pub mod matching;
pub mod notification;
pub mod otp;

pub use matching::select_candidate;
pub use notification::{Envelope, MockNotifier, NotificationResult, Notifier};
pub use otp::{generate_otp_code, ConsoleOtpSender, OtpSendError, OtpSender};
