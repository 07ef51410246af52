// ── Bridge status ──

use serde::{Deserialize, Serialize};

/// Health record of the bridge. Replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub connected: bool,
    /// Human-readable, as reported by the bridge (e.g. `12:34:56`).
    pub uptime: String,
    /// Signal strength, percent in `[0, 100]`.
    pub signal_percent: u8,
    /// Memory usage, percent in `[0, 100]`.
    pub memory_percent: u8,
    pub ip_address: String,
    pub mac_address: String,
    pub firmware_version: String,
    pub network_name: String,
    pub broker_address: String,
}

impl BridgeStatus {
    pub fn connection_label(&self) -> &'static str {
        if self.connected { "ONLINE" } else { "OFFLINE" }
    }
}
