//! ICMP ping effector — shells out to the platform `ping` binary and parses
//! its output. No raw-socket ICMP is used; this mirrors how the rest of the
//! corpus spawns well-known system binaries rather than reimplementing their
//! protocols.

use std::process::Stdio;
use std::time::Duration;

use once_cell_regex::hostname_re;
use once_cell_regex::loss_re;
use once_cell_regex::time_re;
use serde::Serialize;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Clone, Serialize)]
pub struct PingResult {
    pub host: String,
    pub reachable: bool,
    pub avg_latency_ms: Option<f64>,
    pub packet_loss_pct: Option<f64>,
    pub raw_snippet: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("invalid hostname: {0}")]
    InvalidHostname(String),
    #[error("ping subprocess timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to spawn ping subprocess: {0}")]
    Spawn(String),
}

/// RFC 1123 hostname / dotted-quad, bounded to 253 characters.
fn is_valid_hostname(host: &str) -> bool {
    host.len() <= 253 && hostname_re().is_match(host)
}

pub async fn ping(host: &str, count: u32, timeout_dur: Duration) -> Result<PingResult, PingError> {
    if !is_valid_hostname(host) {
        return Err(PingError::InvalidHostname(host.to_string()));
    }

    let mut cmd = platform_command(host, count, timeout_dur);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let child = cmd.output();
    let output = timeout(timeout_dur + Duration::from_secs(2), child)
        .await
        .map_err(|_| PingError::Timeout(timeout_dur))?
        .map_err(|e| PingError::Spawn(e.to_string()))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let combined = format!("{stdout}{stderr}");

    let avg_latency_ms = parse_avg_latency(&combined);
    let packet_loss_pct = parse_packet_loss(&combined);

    let reachable = output.status.success()
        && packet_loss_pct.map(|loss| loss < 100.0).unwrap_or(false);

    let raw_snippet: String = combined.lines().take(8).collect::<Vec<_>>().join("\n");

    tracing::info!(host, reachable, ?avg_latency_ms, ?packet_loss_pct, "ping completed");

    Ok(PingResult {
        host: host.to_string(),
        reachable,
        avg_latency_ms,
        packet_loss_pct,
        raw_snippet,
    })
}

#[cfg(target_os = "windows")]
fn platform_command(host: &str, count: u32, timeout_dur: Duration) -> Command {
    let mut cmd = Command::new("ping");
    cmd.arg("-n")
        .arg(count.to_string())
        .arg("-w")
        .arg(timeout_dur.as_millis().to_string())
        .arg(host);
    cmd
}

#[cfg(target_os = "macos")]
fn platform_command(host: &str, count: u32, timeout_dur: Duration) -> Command {
    let mut cmd = Command::new("ping");
    cmd.arg("-c")
        .arg(count.to_string())
        .arg("-t")
        .arg(timeout_dur.as_secs().max(1).to_string())
        .arg(host);
    cmd
}

#[cfg(all(unix, not(target_os = "macos")))]
fn platform_command(host: &str, count: u32, timeout_dur: Duration) -> Command {
    let mut cmd = Command::new("ping");
    cmd.arg("-c")
        .arg(count.to_string())
        .arg("-W")
        .arg(timeout_dur.as_secs().max(1).to_string())
        .arg(host);
    cmd
}

fn parse_avg_latency(output: &str) -> Option<f64> {
    // Prefer an explicit rtt/round-trip summary line ("min/avg/max").
    if let Some(avg) = parse_rtt_summary(output) {
        return Some(avg);
    }
    // Otherwise average every per-packet `time=`/`time<` value we can find.
    let samples: Vec<f64> = time_re()
        .captures_iter(output)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .collect();
    if samples.is_empty() {
        None
    } else {
        Some(samples.iter().sum::<f64>() / samples.len() as f64)
    }
}

fn parse_rtt_summary(output: &str) -> Option<f64> {
    for line in output.lines() {
        let lower = line.to_ascii_lowercase();
        if lower.contains("min/avg/max") || lower.contains("minimum/maximum/average") {
            let nums = lower.rsplit('=').next()?.trim();
            let parts: Vec<&str> = nums.split('/').collect();
            if parts.len() >= 2 {
                return parts[1].trim().parse::<f64>().ok();
            }
        }
    }
    None
}

fn parse_packet_loss(output: &str) -> Option<f64> {
    loss_re()
        .captures(output)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

mod once_cell_regex {
    use regex::Regex;
    use std::sync::OnceLock;

    pub fn hostname_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]{1,253}$").unwrap())
    }

    pub fn time_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"time[=<]([0-9]+(?:\.[0-9]+)?)").unwrap())
    }

    pub fn loss_re() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        RE.get_or_init(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)%\s*(?:packet )?loss").unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_oversized_hostname() {
        let host = "a".repeat(254);
        assert!(!is_valid_hostname(&host));
    }

    #[test]
    fn accepts_typical_hostnames() {
        assert!(is_valid_hostname("example.com"));
        assert!(is_valid_hostname("192.168.1.1"));
        assert!(is_valid_hostname("my-host_01.local"));
    }

    #[test]
    fn rejects_shell_metacharacters() {
        assert!(!is_valid_hostname("example.com; rm -rf /"));
        assert!(!is_valid_hostname("$(whoami)"));
    }

    #[test]
    fn parses_linux_style_summary() {
        let output = "\
64 bytes from 1.1.1.1: icmp_seq=1 ttl=59 time=12.3 ms
64 bytes from 1.1.1.1: icmp_seq=2 ttl=59 time=11.9 ms

--- 1.1.1.1 ping statistics ---
2 packets transmitted, 2 received, 0% packet loss, time 1001ms
rtt min/avg/max/mdev = 11.900/12.100/12.300/0.200 ms";
        assert_eq!(parse_packet_loss(output), Some(0.0));
        assert_eq!(parse_avg_latency(output), Some(12.100));
    }

    #[test]
    fn parses_full_packet_loss() {
        let output = "--- host ping statistics ---\n3 packets transmitted, 0 received, 100% packet loss";
        assert_eq!(parse_packet_loss(output), Some(100.0));
    }
}
