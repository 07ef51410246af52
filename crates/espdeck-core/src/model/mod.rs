// ── Domain model ──
//
// Canonical types consumers work with. Built from wire types in `convert`.

pub mod device;
pub mod log;
pub mod status;

pub use device::{Device, DeviceCategory};
pub use log::{LogEntry, LogLevel};
pub use status::BridgeStatus;
