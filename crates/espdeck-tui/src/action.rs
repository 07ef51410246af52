//! Every state transition in the TUI is expressed as an [`Action`].

use std::fmt;
use std::sync::Arc;

use espdeck_core::{BridgeStatus, Device, LogEntry, Operation};

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A short-lived toast in the bottom-right corner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// Actions that wait behind a y/n dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    RestartBridge { endpoint: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestartBridge { endpoint } => write!(f, "Restart the bridge at {endpoint}?"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),

    // ── Data (from the controller) ────────────────────────────────
    DevicesUpdated(Arc<Vec<Arc<Device>>>),
    StatusUpdated(Arc<BridgeStatus>),
    LogsUpdated(Arc<Vec<Arc<LogEntry>>>),
    LoadingChanged(bool),
    RestartAcknowledged(String),
    Diagnostic { operation: Operation, message: String },

    // ── Commands ──────────────────────────────────────────────────
    ToggleDevice(String),
    SetDeviceValue { id: String, value: f64 },
    RequestRestart,

    // ── Dialogs ───────────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,
    DismissAcknowledgement,
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}
