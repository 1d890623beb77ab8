//! Tri-state connection status surfaced on `GET /health` (spec §6): a
//! synchronizer that was never configured is `not_configured`; once
//! configured but before the websocket has authenticated it is `configured`;
//! after a successful handshake it flips to `connected`, and back to
//! `disconnected` the moment the connection drops.

use std::sync::atomic::{AtomicU8, Ordering};

const CONFIGURED: u8 = 0;
const CONNECTED: u8 = 1;
const DISCONNECTED: u8 = 2;

pub struct ConnectionStatus(AtomicU8);

impl ConnectionStatus {
    pub fn new() -> Self {
        Self(AtomicU8::new(CONFIGURED))
    }

    pub fn set_connected(&self) {
        self.0.store(CONNECTED, Ordering::Relaxed);
    }

    pub fn set_disconnected(&self) {
        self.0.store(DISCONNECTED, Ordering::Relaxed);
    }

    /// `None` means "not yet known to ever have connected" (i.e. still the
    /// initial `configured` state); the synchronizer maps that onto
    /// `not_configured` or `configured` depending on whether HA is wired up.
    pub fn as_str(&self) -> &'static str {
        match self.0.load(Ordering::Relaxed) {
            CONNECTED => "connected",
            DISCONNECTED => "disconnected",
            _ => "configured",
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_configured() {
        assert_eq!(ConnectionStatus::new().as_str(), "configured");
    }

    #[test]
    fn transitions_through_connected_and_disconnected() {
        let status = ConnectionStatus::new();
        status.set_connected();
        assert_eq!(status.as_str(), "connected");
        status.set_disconnected();
        assert_eq!(status.as_str(), "disconnected");
    }
}
