pub mod ntp;
pub mod ping;

pub use ntp::{NtpEffector, NtpResult};
pub use ping::{ping, PingError, PingResult};
