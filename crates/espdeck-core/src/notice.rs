// ── Notices ──
//
// Out-of-band signals from the controller: the one user-facing
// acknowledgement (restart) and developer-facing diagnostics.

use strum::{Display, IntoStaticStr};

/// Which controller operation a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    RefreshDevices,
    RefreshStatus,
    RefreshLogs,
    ToggleDevice,
    UpdateDeviceValue,
    Restart,
}

/// Broadcast by [`Controller::notices`](crate::Controller::notices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The bridge accepted a restart. Shown to the user exactly once.
    RestartAcknowledged { message: String },
    /// An operation failed; state was left untouched.
    Diagnostic { operation: Operation, message: String },
}

impl Notice {
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Self::Diagnostic { .. })
    }
}
