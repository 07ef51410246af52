// Bridge wire types
//
// Shapes exactly as the bridge emits them. Read endpoints wrap their payload
// in a keyed envelope (`devices`, `esp32`, `logs`) next to a `timestamp`;
// write endpoints answer with `{ success, device?, message? }`. Fields use
// `#[serde(default)]` where the bridge is known to omit them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Envelopes ────────────────────────────────────────────────────────

/// `GET ?endpoint=devices`
#[derive(Debug, Deserialize)]
pub struct DevicesEnvelope {
    pub devices: Vec<Device>,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

/// `GET ?endpoint=status`
#[derive(Debug, Deserialize)]
pub struct StatusEnvelope {
    pub esp32: BridgeStatus,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

/// `GET ?endpoint=logs&limit=N`
#[derive(Debug, Deserialize)]
pub struct LogsEnvelope {
    /// Decoded entry by entry so one bad entry does not sink the window.
    pub logs: Vec<serde_json::Value>,
}

/// Error body returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

// ── Device ───────────────────────────────────────────────────────────

/// A device as served by the bridge.
///
/// `type` is kept as a raw string: the category set is open and the
/// domain layer decides how to interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub status: bool,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub value: Option<f64>,
}

// ── Status ───────────────────────────────────────────────────────────

/// Bridge health record (`esp32` key on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeStatus {
    pub connected: bool,
    #[serde(default)]
    pub uptime: String,
    /// Signal strength, percent.
    #[serde(default)]
    pub signal: i64,
    /// Memory usage, percent.
    #[serde(default)]
    pub memory: i64,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub mac_address: String,
    #[serde(default)]
    pub firmware_version: String,
    #[serde(default)]
    pub wifi_ssid: String,
    #[serde(default)]
    pub mqtt_server: String,
}

// ── Logs ─────────────────────────────────────────────────────────────

/// Log severity. Closed set: an entry with any other level fails to decode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One entry of the bridge command journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: LogLevel,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}

// ── Actions ──────────────────────────────────────────────────────────

/// POST body. Serialized as `{"action": "<tag>", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    Toggle { device_id: String },
    UpdateValue { device_id: String, value: f64 },
    Restart,
}

impl ActionRequest {
    /// The wire tag, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Toggle { .. } => "toggle",
            Self::UpdateValue { .. } => "update_value",
            Self::Restart => "restart",
        }
    }
}

/// POST response. Only `success: true` counts as success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub device: Option<Device>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn action_request_wire_shape() {
        let toggle = serde_json::to_value(ActionRequest::Toggle {
            device_id: "1".into(),
        })
        .unwrap();
        assert_eq!(toggle, json!({ "action": "toggle", "device_id": "1" }));

        let update = serde_json::to_value(ActionRequest::UpdateValue {
            device_id: "2".into(),
            value: 21.5,
        })
        .unwrap();
        assert_eq!(
            update,
            json!({ "action": "update_value", "device_id": "2", "value": 21.5 })
        );

        let restart = serde_json::to_value(ActionRequest::Restart).unwrap();
        assert_eq!(restart, json!({ "action": "restart" }));
    }

    #[test]
    fn device_tolerates_missing_value_and_unknown_type() {
        let device: Device = serde_json::from_value(json!({
            "id": "9",
            "name": "Garage",
            "type": "garage_door",
            "status": false,
            "icon": "Warehouse"
        }))
        .unwrap();
        assert_eq!(device.device_type, "garage_door");
        assert_eq!(device.value, None);
    }

    #[test]
    fn unknown_log_level_fails_to_decode() {
        let result: Result<LogEntry, _> = serde_json::from_value(json!({
            "timestamp": "2024-06-15T10:30:00",
            "level": "DEBUG",
            "action": "toggle",
            "message": "x",
            "request_id": "r"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!(LogLevel::Success.to_string(), "SUCCESS");
    }

    #[test]
    fn action_response_success_requires_explicit_true() {
        let missing: ActionResponse = serde_json::from_value(json!({ "message": "ok" })).unwrap();
        assert!(!missing.is_success());

        let falsy: ActionResponse = serde_json::from_value(json!({ "success": false })).unwrap();
        assert!(!falsy.is_success());

        let ok: ActionResponse = serde_json::from_value(json!({ "success": true })).unwrap();
        assert!(ok.is_success());
    }
}
