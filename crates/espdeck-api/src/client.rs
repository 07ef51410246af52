// Bridge HTTP client
//
// Wraps `reqwest::Client` with the bridge's single-endpoint addressing:
// reads are `GET <endpoint>?endpoint=<kind>`, writes are `POST <endpoint>`
// with an `{"action": ...}` JSON body. Envelopes are stripped before the
// caller sees the payload.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::models::{
    ActionRequest, ActionResponse, BridgeStatus, Device, DevicesEnvelope, ErrorBody, LogEntry,
    LogsEnvelope, StatusEnvelope,
};
use crate::transport::TransportConfig;

/// Upper bound on how much of a response body ends up in error messages.
const BODY_PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the bridge endpoint.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct BridgeClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl BridgeClient {
    /// Create a client for `endpoint` from a `TransportConfig`.
    pub fn new(endpoint: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, endpoint })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoint: Url) -> Self {
        Self { http, endpoint }
    }

    /// The bridge endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// List every device.
    ///
    /// `GET ?endpoint=devices` -> `{ devices: [...] }`
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.read_url("devices", &[]);
        let envelope: DevicesEnvelope = self.get(url).await?;
        Ok(envelope.devices)
    }

    /// Fetch the bridge status record.
    ///
    /// `GET ?endpoint=status` -> `{ esp32: {...} }`
    pub async fn get_status(&self) -> Result<BridgeStatus, Error> {
        let url = self.read_url("status", &[]);
        let envelope: StatusEnvelope = self.get(url).await?;
        Ok(envelope.esp32)
    }

    /// Fetch the most recent `limit` journal entries, in bridge order.
    ///
    /// `GET ?endpoint=logs&limit=N` -> `{ logs: [...] }`
    ///
    /// Entries that fail to decode (e.g. an unknown level) are dropped with
    /// a warning; a body without a `logs` array is still an error.
    pub async fn list_logs(&self, limit: usize) -> Result<Vec<LogEntry>, Error> {
        let limit = limit.to_string();
        let url = self.read_url("logs", &[("limit", &limit)]);
        let envelope: LogsEnvelope = self.get(url).await?;
        Ok(decode_log_entries(envelope.logs))
    }

    /// Fetch a single device.
    ///
    /// `GET ?endpoint=device&id=<id>` -> bare device object.
    pub async fn get_device(&self, id: &str) -> Result<Device, Error> {
        let url = self.read_url("device", &[("id", id)]);
        self.get(url).await
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Flip a device's on/off status. Returns the device as the bridge now sees it.
    pub async fn toggle_device(&self, device_id: &str) -> Result<Device, Error> {
        let resp = self
            .post(&ActionRequest::Toggle {
                device_id: device_id.to_owned(),
            })
            .await?;
        Self::require_device(resp)
    }

    /// Set a device's numeric value. No range checks happen here.
    pub async fn update_device_value(&self, device_id: &str, value: f64) -> Result<Device, Error> {
        let resp = self
            .post(&ActionRequest::UpdateValue {
                device_id: device_id.to_owned(),
                value,
            })
            .await?;
        Self::require_device(resp)
    }

    /// Ask the bridge to restart. Returns the acknowledgement message, if any.
    pub async fn restart(&self) -> Result<Option<String>, Error> {
        let resp = self.post(&ActionRequest::Restart).await?;
        Ok(resp.message)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build `<endpoint>?endpoint=<kind>&<extra...>`, keeping any query
    /// parameters already present on the configured endpoint.
    fn read_url(&self, kind: &str, extra: &[(&str, &str)]) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("endpoint", kind);
            for (key, value) in extra {
                pairs.append_pair(key, value);
            }
        }
        url
    }

    /// Send a GET request and decode the body.
    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        Self::parse_body(resp).await
    }

    /// Send a POST action and require `success: true`.
    async fn post(&self, action: &ActionRequest) -> Result<ActionResponse, Error> {
        debug!(action = action.name(), "POST {}", self.endpoint);

        let resp = self
            .http
            .post(self.endpoint.clone())
            .json(action)
            .send()
            .await
            .map_err(Error::Transport)?;

        let body: ActionResponse = Self::parse_body(resp).await?;
        if body.is_success() {
            Ok(body)
        } else {
            Err(Error::Rejected {
                message: body
                    .error
                    .or(body.message)
                    .unwrap_or_else(|| format!("{} not acknowledged", action.name())),
            })
        }
    }

    /// Check the status, then decode JSON with a body preview on failure.
    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body).map_or_else(
                |_| preview(&body).to_owned(),
                |err| err.error,
            );
            return Err(Error::Http {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body: body.clone(),
        })
    }

    fn require_device(resp: ActionResponse) -> Result<Device, Error> {
        resp.device.ok_or_else(|| Error::Deserialization {
            message: "successful response is missing `device`".into(),
            body: String::new(),
        })
    }
}

fn decode_log_entries(raw: Vec<serde_json::Value>) -> Vec<LogEntry> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(index, error = %e, "dropping malformed log entry");
                None
            }
        })
        .collect()
}

/// First `BODY_PREVIEW_LEN` bytes of `body`, cut on a char boundary.
fn preview(body: &str) -> &str {
    if body.len() <= BODY_PREVIEW_LEN {
        return body;
    }
    let mut end = BODY_PREVIEW_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "é".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= BODY_PREVIEW_LEN);
        assert!(cut.chars().all(|c| c == 'é'));
    }

    #[test]
    fn malformed_log_entries_are_dropped() {
        let raw = vec![
            serde_json::json!({
                "timestamp": "2024-06-15T10:35:00",
                "level": "DEBUG",
                "message": "?",
                "request_id": "r1"
            }),
            serde_json::json!({
                "timestamp": "2024-06-15T10:35:01",
                "level": "ERROR",
                "message": "relay stuck",
                "request_id": "r2"
            }),
        ];

        let entries = decode_log_entries(raw);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].request_id, "r2");
    }

    #[test]
    fn read_url_keeps_existing_query() {
        let endpoint = Url::parse("http://bridge.local/api?token=abc").unwrap();
        let client = BridgeClient::with_client(reqwest::Client::new(), endpoint);
        let url = client.read_url("logs", &[("limit", "50")]);
        assert_eq!(
            url.as_str(),
            "http://bridge.local/api?token=abc&endpoint=logs&limit=50"
        );
    }
}
