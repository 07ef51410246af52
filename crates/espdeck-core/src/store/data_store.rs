// ── Central reactive data store ──
//
// The three client-side snapshots (devices, status, logs), each replaced
// independently. Mutations are broadcast to subscribers via `watch`
// channels; there is no other shared mutable state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use strum::{Display, EnumIter};
use tokio::sync::watch;

use super::collection::EntityCollection;
use crate::model::{BridgeStatus, Device, LogEntry};
use crate::stream::EntityStream;

/// The periodically refreshed snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum RefreshKind {
    Devices,
    Status,
    Logs,
}

/// Reactive store for everything the bridge reports.
///
/// Reads are cheap `Arc` clones. Writes are crate-private: only the
/// [`Controller`](crate::Controller) applies bridge responses.
pub struct DataStore {
    pub(crate) devices: EntityCollection<Device>,
    pub(crate) logs: watch::Sender<Arc<Vec<Arc<LogEntry>>>>,
    pub(crate) status: watch::Sender<Option<Arc<BridgeStatus>>>,
    /// `true` until the first successful device refresh.
    pub(crate) loading: watch::Sender<bool>,
    pub(crate) last_refresh: DashMap<RefreshKind, DateTime<Utc>>,
}

impl DataStore {
    pub fn new() -> Self {
        let (logs, _) = watch::channel(Arc::new(Vec::new()));
        let (status, _) = watch::channel(None);
        let (loading, _) = watch::channel(true);

        Self {
            devices: EntityCollection::new(),
            logs,
            status,
            loading,
            last_refresh: DashMap::new(),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace the whole device list and clear the loading flag.
    pub(crate) fn apply_devices(&self, devices: Vec<Device>) {
        self.devices
            .replace_all(devices.into_iter().map(Arc::new).collect());
        self.loading.send_if_modified(|loading| {
            let was_loading = *loading;
            *loading = false;
            was_loading
        });
        self.stamp(RefreshKind::Devices);
    }

    pub(crate) fn apply_status(&self, status: BridgeStatus) {
        self.status.send_modify(|s| *s = Some(Arc::new(status)));
        self.stamp(RefreshKind::Status);
    }

    pub(crate) fn apply_logs(&self, logs: Vec<LogEntry>) {
        let logs: Vec<Arc<LogEntry>> = logs.into_iter().map(Arc::new).collect();
        self.logs.send_modify(|l| *l = Arc::new(logs));
        self.stamp(RefreshKind::Logs);
    }

    /// Replace a single device in place. No-op (returns `false`) if its id
    /// is not in the current list.
    pub(crate) fn merge_device(&self, device: Arc<Device>) -> bool {
        self.devices.replace(device)
    }

    fn stamp(&self, kind: RefreshKind) {
        self.last_refresh.insert(kind, Utc::now());
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn devices_snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.snapshot()
    }

    pub fn logs_snapshot(&self) -> Arc<Vec<Arc<LogEntry>>> {
        self.logs.borrow().clone()
    }

    pub fn status(&self) -> Option<Arc<BridgeStatus>> {
        self.status.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn device(&self, id: &str) -> Option<Arc<Device>> {
        self.devices.get(id)
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    /// Devices currently switched on.
    pub fn active_device_count(&self) -> usize {
        self.devices.snapshot().iter().filter(|d| d.status).count()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_devices(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices.subscribe())
    }

    pub fn subscribe_logs(&self) -> EntityStream<LogEntry> {
        EntityStream::new(self.logs.subscribe())
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Option<Arc<BridgeStatus>>> {
        self.status.subscribe()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    // ── Freshness ────────────────────────────────────────────────────

    /// When `kind` was last replaced from a bridge response.
    pub fn last_refresh(&self, kind: RefreshKind) -> Option<DateTime<Utc>> {
        self.last_refresh.get(&kind).map(|r| *r.value())
    }

    /// Time since the most recent applied read of any kind.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh
            .iter()
            .map(|r| *r.value())
            .max()
            .map(|ts| Utc::now() - ts)
    }
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use espdeck_api::LogLevel;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::DeviceCategory;

    fn device(id: &str, status: bool, value: Option<f64>) -> Device {
        Device {
            id: id.into(),
            name: format!("Device {id}"),
            category: DeviceCategory::Lighting,
            status,
            icon: "Lightbulb".into(),
            value,
        }
    }

    #[test]
    fn loading_clears_on_first_device_list() {
        let store = DataStore::new();
        let mut rx = store.subscribe_loading();
        assert!(store.is_loading());

        store.apply_devices(vec![device("1", true, Some(10.0))]);
        assert!(!store.is_loading());
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.apply_devices(vec![]);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn status_and_logs_do_not_touch_loading() {
        let store = DataStore::new();
        store.apply_status(crate::model::BridgeStatus {
            connected: true,
            uptime: "0:01".into(),
            signal_percent: 80,
            memory_percent: 40,
            ip_address: String::new(),
            mac_address: String::new(),
            firmware_version: String::new(),
            network_name: String::new(),
            broker_address: String::new(),
        });
        store.apply_logs(vec![]);
        assert!(store.is_loading());
        assert!(store.last_refresh(RefreshKind::Status).is_some());
        assert!(store.last_refresh(RefreshKind::Devices).is_none());
    }

    #[test]
    fn merge_replaces_only_matching_device() {
        let store = DataStore::new();
        store.apply_devices(vec![device("1", false, None), device("2", true, Some(5.0))]);

        let merged = store.merge_device(Arc::new(device("1", true, Some(75.0))));
        assert!(merged);

        let snap = store.devices_snapshot();
        assert_eq!(*snap[0], device("1", true, Some(75.0)));
        assert_eq!(*snap[1], device("2", true, Some(5.0)));
        assert_eq!(store.active_device_count(), 2);
    }

    #[test]
    fn merge_of_unknown_device_is_ignored() {
        let store = DataStore::new();
        store.apply_devices(vec![device("1", false, None)]);
        let before = store.devices_snapshot();

        assert!(!store.merge_device(Arc::new(device("9", true, None))));
        assert_eq!(before, store.devices_snapshot());
    }

    #[test]
    fn logs_keep_bridge_order() {
        let store = DataStore::new();
        let entry = |ts: &str| LogEntry {
            timestamp: ts.into(),
            level: LogLevel::Info,
            action: "poll".into(),
            device_id: None,
            device_name: None,
            message: String::new(),
            request_id: String::new(),
        };
        store.apply_logs(vec![entry("b"), entry("c"), entry("a")]);
        let order: Vec<_> = store
            .logs_snapshot()
            .iter()
            .map(|l| l.timestamp.clone())
            .collect();
        assert_eq!(order, ["b", "c", "a"]);
        assert!(store.data_age().is_some());
    }
}
