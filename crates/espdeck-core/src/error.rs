// ── Core error types ──
//
// User-facing errors from espdeck-core. Consumers never see raw HTTP
// bodies or JSON parse failures: the `From<espdeck_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach bridge at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Bridge request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {identifier}")]
    DeviceNotFound { identifier: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Operation rejected by bridge: {message}")]
    Rejected { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Narrow a generic "not found" into a device lookup failure.
    pub(crate) fn for_device(self, identifier: &str) -> Self {
        match self {
            Self::Api {
                status: Some(404), ..
            } => Self::DeviceNotFound {
                identifier: identifier.to_owned(),
            },
            other => other,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<espdeck_api::Error> for CoreError {
    fn from(err: espdeck_api::Error) -> Self {
        match err {
            espdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e.url().map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            espdeck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            espdeck_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            espdeck_api::Error::Http { status, message } => CoreError::Api {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            espdeck_api::Error::Rejected { message } => CoreError::Rejected { message },
            espdeck_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Malformed bridge response: {message}"),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_404_narrows_to_device_not_found() {
        let err = CoreError::from(espdeck_api::Error::Http {
            status: 404,
            message: "Device not found".into(),
        })
        .for_device("7");
        assert!(matches!(err, CoreError::DeviceNotFound { ref identifier } if identifier == "7"));
    }

    #[test]
    fn other_errors_pass_through_for_device() {
        let err = CoreError::from(espdeck_api::Error::Rejected {
            message: "busy".into(),
        })
        .for_device("7");
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[test]
    fn malformed_payload_is_api_error() {
        let err = CoreError::from(espdeck_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        });
        assert!(
            matches!(err, CoreError::Api { status: None, ref message } if message.contains("Malformed"))
        );
    }
}
