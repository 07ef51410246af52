//! Reactive data layer between `espdeck-api` and UI consumers (CLI / TUI).
//!
//! This crate owns the client-side state synchronization loop for a
//! smart-home bridge:
//!
//! - **[`Controller`]**: central facade. [`start()`](Controller::start)
//!   spawns the poll task, which reads devices, status and logs once
//!   immediately and then on every period.
//!   [`Controller::oneshot()`](Controller::oneshot) runs a single closure
//!   without a timer for CLI invocations.
//!
//! - **[`DataStore`]**: three independently replaced snapshots (device list,
//!   bridge status, log window) broadcast through `tokio::sync::watch`.
//!   A successful write merges only the affected device.
//!
//! - **[`EntityStream<T>`]**: subscription handle vended by the store, with
//!   `current()` / `latest()` / `changed()` for reactive rendering.
//!
//! - **[`Notice`]**: broadcast of user-facing acknowledgements and
//!   developer-facing diagnostics.
//!
//! - **[`Command`]**: typed write requests for
//!   [`Controller::execute`](Controller::execute).

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod notice;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{BridgeConfig, TlsVerification};
pub use controller::{Controller, RefreshOutcome};
pub use error::CoreError;
pub use notice::{Notice, Operation};
pub use store::{DataStore, RefreshKind};
pub use stream::EntityStream;

pub use model::{BridgeStatus, Device, DeviceCategory, LogEntry, LogLevel};
