// ── Controller ──
//
// Owns the state synchronization loop: a single recurring poll of the
// three read endpoints, sequenced application of their responses, and
// write actions that merge the one affected device back into the store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use strum::IntoEnumIterator;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use espdeck_api::transport::{TlsMode, TransportConfig};
use espdeck_api::BridgeClient;

use crate::command::{Command, CommandResult};
use crate::config::{BridgeConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{BridgeStatus, Device, LogEntry};
use crate::notice::{Notice, Operation};
use crate::store::{DataStore, RefreshKind, Sequencer};
use crate::stream::EntityStream;

const NOTICE_CHANNEL_SIZE: usize = 64;

/// Fallback acknowledgement when the bridge sends no message.
const DEFAULT_RESTART_MESSAGE: &str = "Bridge restart initiated";

/// What happened to a read response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced.
    Applied,
    /// A newer request of the same kind was issued meanwhile; the response was dropped.
    Superseded,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Views see read accessors
/// (snapshots, subscriptions, notices) and the action methods; all state
/// lives in the controller's [`DataStore`].
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: BridgeConfig,
    client: BridgeClient,
    store: Arc<DataStore>,
    sequences: Sequences,
    notices: broadcast::Sender<Notice>,
    cancel: CancellationToken,
    /// Child token for the current run; cancelled on shutdown, replaced on start.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

/// One sequencer per read kind.
struct Sequences {
    devices: Sequencer,
    status: Sequencer,
    logs: Sequencer,
}

impl Controller {
    /// Create a controller for `config`. Builds the HTTP client but sends
    /// nothing; call [`start()`](Self::start) to begin polling.
    pub fn new(config: BridgeConfig) -> Result<Self, CoreError> {
        let client = BridgeClient::new(config.endpoint.clone(), &build_transport(&config))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a controller around an existing client.
    pub fn with_client(config: BridgeConfig, client: BridgeClient) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                store: Arc::new(DataStore::new()),
                sequences: Sequences {
                    devices: Sequencer::new(),
                    status: Sequencer::new(),
                    logs: Sequencer::new(),
                },
                notices,
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the bridge configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start the recurring poll. The first tick fires immediately.
    ///
    /// Calling `start` on a running controller does nothing.
    pub async fn start(&self) {
        let mut handles = self.inner.task_handles.lock().await;
        if !handles.is_empty() {
            debug!("poll task already running");
            return;
        }

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        let period = self.inner.config.poll_interval;
        handles.push(tokio::spawn(poll_task(self.clone(), period, child)));
        info!(endpoint = %self.inner.config.endpoint, ?period, "polling bridge");
    }

    /// Stop polling. Cancels the timer, aborts in-flight poll requests and
    /// waits for the poll task to exit. No request is issued by the poll
    /// after this returns.
    pub async fn shutdown(&self) {
        self.inner.cancel_child.lock().await.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("controller shut down");
    }

    /// Whether the poll task is running.
    pub async fn is_running(&self) -> bool {
        !self.inner.task_handles.lock().await.is_empty()
    }

    /// Run `f` against a controller that never polls, for one-shot CLI use.
    pub async fn oneshot<F, Fut, T>(config: BridgeConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let controller = Controller::new(config)?;
        let result = f(controller.clone()).await;
        controller.shutdown().await;
        result
    }

    // ── Reads (infallible) ───────────────────────────────────────
    //
    // Failures leave the snapshot untouched and become diagnostics.

    pub async fn refresh_devices(&self) {
        if let Err(e) = self.try_refresh_devices().await {
            self.diagnose(Operation::RefreshDevices, &e);
        }
    }

    pub async fn refresh_status(&self) {
        if let Err(e) = self.try_refresh_status().await {
            self.diagnose(Operation::RefreshStatus, &e);
        }
    }

    pub async fn refresh_logs(&self) {
        if let Err(e) = self.try_refresh_logs().await {
            self.diagnose(Operation::RefreshLogs, &e);
        }
    }

    /// Run all three reads concurrently.
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.refresh_devices(),
            self.refresh_status(),
            self.refresh_logs()
        );
    }

    async fn refresh(&self, kind: RefreshKind) {
        match kind {
            RefreshKind::Devices => self.refresh_devices().await,
            RefreshKind::Status => self.refresh_status().await,
            RefreshKind::Logs => self.refresh_logs().await,
        }
    }

    // ── Reads (fallible) ─────────────────────────────────────────

    pub async fn try_refresh_devices(&self) -> Result<RefreshOutcome, CoreError> {
        let seq = self.inner.sequences.devices.issue();
        let devices = self.inner.client.list_devices().await.map_err(|e| self.core_err(e))?;
        let devices: Vec<Device> = devices.into_iter().map(Device::from).collect();

        let store = &self.inner.store;
        Ok(outcome(
            RefreshKind::Devices,
            seq,
            self.inner
                .sequences
                .devices
                .commit(seq, || store.apply_devices(devices)),
        ))
    }

    pub async fn try_refresh_status(&self) -> Result<RefreshOutcome, CoreError> {
        let seq = self.inner.sequences.status.issue();
        let status = self.inner.client.get_status().await.map_err(|e| self.core_err(e))?;
        let status = BridgeStatus::from(status);

        let store = &self.inner.store;
        Ok(outcome(
            RefreshKind::Status,
            seq,
            self.inner
                .sequences
                .status
                .commit(seq, || store.apply_status(status)),
        ))
    }

    pub async fn try_refresh_logs(&self) -> Result<RefreshOutcome, CoreError> {
        let seq = self.inner.sequences.logs.issue();
        let logs = self
            .inner
            .client
            .list_logs(self.inner.config.log_limit)
            .await
            .map_err(|e| self.core_err(e))?;
        let logs: Vec<LogEntry> = logs.into_iter().map(LogEntry::from).collect();

        let store = &self.inner.store;
        Ok(outcome(
            RefreshKind::Logs,
            seq,
            self.inner
                .sequences
                .logs
                .commit(seq, || store.apply_logs(logs)),
        ))
    }

    /// Fetch a single device and merge it like a write response.
    pub async fn fetch_device(&self, id: &str) -> Result<Arc<Device>, CoreError> {
        let device = self
            .inner
            .client
            .get_device(id)
            .await
            .map_err(|e| self.core_err(e).for_device(id))?;
        Ok(self.merge(Device::from(device)))
    }

    // ── Writes (infallible) ──────────────────────────────────────

    /// Toggle `id`. The request is sent even if `id` is not known locally.
    pub async fn toggle_device(&self, id: &str) {
        if let Err(e) = self.try_toggle_device(id).await {
            self.diagnose(Operation::ToggleDevice, &e);
        }
    }

    /// Set `id` to `value`, unvalidated.
    pub async fn update_device_value(&self, id: &str, value: f64) {
        if let Err(e) = self.try_update_device_value(id, value).await {
            self.diagnose(Operation::UpdateDeviceValue, &e);
        }
    }

    /// Request a restart. Success broadcasts exactly one
    /// [`Notice::RestartAcknowledged`]; failure only a diagnostic.
    pub async fn restart(&self) {
        match self.try_restart().await {
            Ok(message) => {
                let _ = self
                    .inner
                    .notices
                    .send(Notice::RestartAcknowledged { message });
            }
            Err(e) => self.diagnose(Operation::Restart, &e),
        }
    }

    // ── Writes (fallible) ────────────────────────────────────────

    /// Toggle `id` and return the device as the bridge now reports it.
    pub async fn try_toggle_device(&self, id: &str) -> Result<Arc<Device>, CoreError> {
        debug!(device_id = id, "toggling device");
        let device = self
            .inner
            .client
            .toggle_device(id)
            .await
            .map_err(|e| self.core_err(e).for_device(id))?;
        Ok(self.merge(Device::from(device)))
    }

    pub async fn try_update_device_value(
        &self,
        id: &str,
        value: f64,
    ) -> Result<Arc<Device>, CoreError> {
        debug!(device_id = id, value, "updating device value");
        let device = self
            .inner
            .client
            .update_device_value(id, value)
            .await
            .map_err(|e| self.core_err(e).for_device(id))?;
        Ok(self.merge(Device::from(device)))
    }

    /// Request a restart and return the acknowledgement text.
    /// Does not broadcast a notice.
    pub async fn try_restart(&self) -> Result<String, CoreError> {
        debug!("requesting bridge restart");
        let message = self
            .inner
            .client
            .restart()
            .await
            .map_err(|e| self.core_err(e))?;
        Ok(message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_RESTART_MESSAGE.to_owned()))
    }

    /// Execute a typed command.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        match cmd {
            Command::ToggleDevice { id } => {
                self.try_toggle_device(&id).await.map(CommandResult::Device)
            }
            Command::SetDeviceValue { id, value } => self
                .try_update_device_value(&id, value)
                .await
                .map(CommandResult::Device),
            Command::Restart => self
                .try_restart()
                .await
                .map(|message| CommandResult::Restarted { message }),
        }
    }

    // ── Observation ──────────────────────────────────────────────

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.store.devices_snapshot()
    }

    pub fn logs_snapshot(&self) -> Arc<Vec<Arc<LogEntry>>> {
        self.inner.store.logs_snapshot()
    }

    pub fn status(&self) -> Option<Arc<BridgeStatus>> {
        self.inner.store.status()
    }

    pub fn devices(&self) -> EntityStream<Device> {
        self.inner.store.subscribe_devices()
    }

    pub fn logs(&self) -> EntityStream<LogEntry> {
        self.inner.store.subscribe_logs()
    }

    pub fn status_watch(&self) -> watch::Receiver<Option<Arc<BridgeStatus>>> {
        self.inner.store.subscribe_status()
    }

    /// `true` until the first successful device refresh.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.inner.store.subscribe_loading()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    pub fn last_refresh(&self, kind: RefreshKind) -> Option<chrono::DateTime<chrono::Utc>> {
        self.inner.store.last_refresh(kind)
    }

    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.inner.store.data_age()
    }

    // ── Helpers ──────────────────────────────────────────────────

    /// Merge a device returned by the bridge; unknown ids are ignored.
    fn merge(&self, device: Device) -> Arc<Device> {
        let device = Arc::new(device);
        if !self.inner.store.merge_device(Arc::clone(&device)) {
            debug!(device_id = %device.id, "response for unknown device ignored");
        }
        device
    }

    fn diagnose(&self, operation: Operation, err: &CoreError) {
        warn!(%operation, error = %err, "bridge operation failed");
        let _ = self.inner.notices.send(Notice::Diagnostic {
            operation,
            message: err.to_string(),
        });
    }

    fn core_err(&self, err: espdeck_api::Error) -> CoreError {
        match CoreError::from(err) {
            CoreError::Timeout { .. } => CoreError::Timeout {
                timeout_secs: self.inner.config.timeout.as_secs(),
            },
            other => other,
        }
    }
}

fn outcome(kind: RefreshKind, seq: u64, applied: bool) -> RefreshOutcome {
    if applied {
        RefreshOutcome::Applied
    } else {
        debug!(%kind, seq, "discarding superseded response");
        RefreshOutcome::Superseded
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Every tick spawns the three reads without waiting for the previous
/// tick's requests. Cancellation aborts whatever is still in flight.
async fn poll_task(controller: Controller, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                for kind in RefreshKind::iter() {
                    let ctrl = controller.clone();
                    in_flight.spawn(async move { ctrl.refresh(kind).await });
                }
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    if e.is_panic() {
                        warn!(error = %e, "poll request panicked");
                    }
                }
            }
        }
    }

    in_flight.abort_all();
    while in_flight.join_next().await.is_some() {}
    debug!("poll task stopped");
}

fn build_transport(config: &BridgeConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}
