// ── Runtime bridge configuration ──
//
// Describes *how* to reach a bridge and how often to poll it.
// Never touches disk: the CLI/TUI builds a `BridgeConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// Default poll period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default size of the log window requested on each poll.
pub const DEFAULT_LOG_LIMIT: usize = 50;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed bridge certificates).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single bridge.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Bridge endpoint URL (reads add `?endpoint=...`, writes POST here).
    pub endpoint: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Period of the recurring refresh.
    pub poll_interval: Duration,
    /// How many of the most recent log entries to request.
    pub log_limit: usize,
}

impl BridgeConfig {
    /// Config for `endpoint` with default timing.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            tls: TlsVerification::default(),
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_log_limit(mut self, log_limit: usize) -> Self {
        self.log_limit = log_limit;
        self
    }
}
