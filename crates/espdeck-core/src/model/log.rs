// ── Bridge command journal ──

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub use espdeck_api::LogLevel;

/// One journal entry. Read-only; held in bridge order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO-ish timestamp string, kept verbatim.
    pub timestamp: String,
    pub level: LogLevel,
    pub action: String,
    /// Soft reference to a device; may dangle.
    pub device_id: Option<String>,
    pub device_name: Option<String>,
    pub message: String,
    pub request_id: String,
}

impl LogEntry {
    /// First eight characters of the correlation id.
    pub fn short_request_id(&self) -> &str {
        self.request_id
            .char_indices()
            .nth(8)
            .map_or(self.request_id.as_str(), |(idx, _)| &self.request_id[..idx])
    }

    /// Time of day, when the timestamp parses as RFC 3339 or a naive ISO datetime.
    pub fn time_of_day(&self) -> Option<NaiveTime> {
        let raw = self.timestamp.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.time());
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|dt| dt.time())
    }
}
