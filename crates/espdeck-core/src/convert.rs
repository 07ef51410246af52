// ── API-to-domain type conversions ──
//
// Bridges raw `espdeck_api` wire types into canonical `espdeck_core::model`
// domain types. Field renames and range normalization happen here so
// consumers never see wire quirks.

use espdeck_api::models as wire;

use crate::model::{BridgeStatus, Device, DeviceCategory, LogEntry};

/// Clamp a raw percentage into `[0, 100]`.
fn percent(raw: i64) -> u8 {
    u8::try_from(raw.clamp(0, 100)).unwrap_or(100)
}

impl From<wire::Device> for Device {
    fn from(d: wire::Device) -> Self {
        Self {
            id: d.id,
            name: d.name,
            category: DeviceCategory::from(d.device_type),
            status: d.status,
            icon: d.icon,
            value: d.value,
        }
    }
}

impl From<wire::BridgeStatus> for BridgeStatus {
    fn from(s: wire::BridgeStatus) -> Self {
        Self {
            connected: s.connected,
            uptime: s.uptime,
            signal_percent: percent(s.signal),
            memory_percent: percent(s.memory),
            ip_address: s.ip_address,
            mac_address: s.mac_address,
            firmware_version: s.firmware_version,
            network_name: s.wifi_ssid,
            broker_address: s.mqtt_server,
        }
    }
}

impl From<wire::LogEntry> for LogEntry {
    fn from(l: wire::LogEntry) -> Self {
        Self {
            timestamp: l.timestamp,
            level: l.level,
            action: l.action,
            device_id: l.device_id.filter(|id| !id.is_empty()),
            device_name: l.device_name.filter(|name| !name.is_empty()),
            message: l.message,
            request_id: l.request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn status_renames_and_clamps() {
        let status = BridgeStatus::from(wire::BridgeStatus {
            connected: true,
            uptime: "1:00:00".into(),
            signal: 140,
            memory: -3,
            ip_address: "10.0.0.2".into(),
            mac_address: "AA:BB:CC:DD:EE:FF".into(),
            firmware_version: "v1".into(),
            wifi_ssid: "Home".into(),
            mqtt_server: "mqtt.local:1883".into(),
        });
        assert_eq!(status.signal_percent, 100);
        assert_eq!(status.memory_percent, 0);
        assert_eq!(status.network_name, "Home");
        assert_eq!(status.broker_address, "mqtt.local:1883");
    }

    #[test]
    fn device_category_mapping() {
        let device = Device::from(wire::Device {
            id: "2".into(),
            name: "Thermostat".into(),
            device_type: "climate".into(),
            status: true,
            icon: "Thermometer".into(),
            value: Some(22.0),
        });
        assert_eq!(device.category, DeviceCategory::Climate);
        assert_eq!(device.value, Some(22.0));
    }

    #[test]
    fn empty_device_reference_is_dropped() {
        let entry = LogEntry::from(wire::LogEntry {
            timestamp: "t".into(),
            level: wire::LogLevel::Warning,
            action: "restart".into(),
            device_id: Some(String::new()),
            device_name: None,
            message: "m".into(),
            request_id: "r".into(),
        });
        assert_eq!(entry.device_id, None);
    }
}
