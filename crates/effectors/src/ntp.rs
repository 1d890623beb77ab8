//! NTP effector — queries the configured primary then backup server, and
//! falls back to the system clock if both are unreachable. Per spec §4.1
//! this call never fails; the fallback path is part of the contract.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::UdpSocket;
use tokio::time::timeout;

const NTP_PORT: u16 = 123;
/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
const NTP_UNIX_EPOCH_DELTA: i64 = 2_208_988_800;

#[derive(Debug, Clone, Serialize)]
pub struct NtpResult {
    pub timestamp: DateTime<Utc>,
    /// `"ntp:<server>"` when a real query succeeded, `"system"` on fallback.
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

pub struct NtpEffector {
    pub primary: String,
    pub backup: String,
    pub timeout: Duration,
}

impl NtpEffector {
    pub fn new(primary: impl Into<String>, backup: impl Into<String>, timeout: Duration) -> Self {
        Self {
            primary: primary.into(),
            backup: backup.into(),
            timeout,
        }
    }

    /// Query primary, then backup, then fall back to the system clock.
    /// Always returns `Ok` — see module doc.
    pub async fn get_time(&self) -> NtpResult {
        match query_server(&self.primary, self.timeout).await {
            Ok(ts) => {
                return NtpResult {
                    timestamp: ts,
                    source: format!("ntp:{}", self.primary),
                    warning: None,
                };
            }
            Err(e) => {
                tracing::warn!(server = %self.primary, error = %e, "primary NTP server failed, trying backup");
            }
        }

        match query_server(&self.backup, self.timeout).await {
            Ok(ts) => {
                return NtpResult {
                    timestamp: ts,
                    source: format!("ntp:{}", self.backup),
                    warning: None,
                };
            }
            Err(e) => {
                tracing::warn!(server = %self.backup, error = %e, "backup NTP server failed, falling back to system clock");
            }
        }

        NtpResult {
            timestamp: Utc::now(),
            source: "system".into(),
            warning: Some(
                "both primary and backup NTP servers were unreachable; using system clock".into(),
            ),
        }
    }
}

async fn query_server(host: &str, deadline: Duration) -> Result<DateTime<Utc>, String> {
    timeout(deadline, query_server_inner(host))
        .await
        .map_err(|_| "timed out".to_string())?
}

async fn query_server_inner(host: &str) -> Result<DateTime<Utc>, String> {
    let socket = UdpSocket::bind("0.0.0.0:0")
        .await
        .map_err(|e| e.to_string())?;

    let addr = if host.contains(':') {
        host.to_string()
    } else {
        format!("{host}:{NTP_PORT}")
    };

    socket.connect(&addr).await.map_err(|e| e.to_string())?;

    let mut packet = [0u8; 48];
    // LI = 0 (no warning), VN = 3 (NTPv3), Mode = 3 (client).
    packet[0] = 0x1B;

    socket.send(&packet).await.map_err(|e| e.to_string())?;

    let mut buf = [0u8; 48];
    let n = socket.recv(&mut buf).await.map_err(|e| e.to_string())?;
    if n < 48 {
        return Err(format!("short NTP reply ({n} bytes)"));
    }

    parse_transmit_timestamp(&buf)
}

/// Bytes 40..48 hold the transmit timestamp: 32-bit seconds since the NTP
/// epoch, 32-bit fractional seconds.
fn parse_transmit_timestamp(buf: &[u8; 48]) -> Result<DateTime<Utc>, String> {
    let seconds = u32::from_be_bytes(buf[40..44].try_into().unwrap());
    let fraction = u32::from_be_bytes(buf[44..48].try_into().unwrap());

    let unix_secs = seconds as i64 - NTP_UNIX_EPOCH_DELTA;
    let nanos = ((fraction as u64) * 1_000_000_000u64) >> 32;

    DateTime::from_timestamp(unix_secs, nanos as u32).ok_or_else(|| "invalid NTP timestamp".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_transmit_timestamp() {
        // 2021-01-01T00:00:00Z in NTP seconds.
        let unix_secs: i64 = 1_609_459_200;
        let ntp_secs = (unix_secs + NTP_UNIX_EPOCH_DELTA) as u32;
        let mut buf = [0u8; 48];
        buf[40..44].copy_from_slice(&ntp_secs.to_be_bytes());

        let parsed = parse_transmit_timestamp(&buf).unwrap();
        assert_eq!(parsed.timestamp(), unix_secs);
    }

    #[tokio::test]
    async fn unreachable_servers_fall_back_to_system_clock() {
        // Port 0 on a reserved test address never replies; the bind itself
        // will succeed but the connect/send/recv path will time out fast
        // with a short deadline.
        let effector = NtpEffector::new(
            "192.0.2.1", // TEST-NET-1, guaranteed unroutable
            "192.0.2.2",
            Duration::from_millis(50),
        );
        let result = effector.get_time().await;
        assert_eq!(result.source, "system");
        assert!(result.warning.is_some());
    }
}
