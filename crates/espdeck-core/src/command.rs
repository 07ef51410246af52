// ── Command API ──
//
// Write operations as data. `Controller::execute` routes each variant to
// the matching fallible controller method.

use std::sync::Arc;

use crate::model::Device;

/// All write operations against a bridge.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleDevice { id: String },
    /// The value is forwarded as given; range policy belongs to the caller.
    SetDeviceValue { id: String, value: f64 },
    Restart,
}

/// Result of a successful [`Command`].
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// The device exactly as the bridge returned it.
    Device(Arc<Device>),
    Restarted { message: String },
}
