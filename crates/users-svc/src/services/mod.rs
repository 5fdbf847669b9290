pub mod otp_service;
pub mod registry;

pub use otp_service::OtpService;
pub use registry::WsRegistry;
