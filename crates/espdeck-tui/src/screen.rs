//! Screen identifiers, navigable by number keys.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Devices, // 1
    Monitoring, // 2
    Settings,   // 3
    Logs,       // 4
}

impl ScreenId {
    /// Tab-bar order.
    pub const ALL: [ScreenId; 4] = [Self::Devices, Self::Monitoring, Self::Settings, Self::Logs];

    pub fn number(self) -> u8 {
        match self {
            Self::Devices => 1,
            Self::Monitoring => 2,
            Self::Settings => 3,
            Self::Logs => 4,
        }
    }

    /// Screen for a number key. `None` when out of range.
    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    /// Next screen in tab order, wrapping.
    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order, wrapping.
    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Devices => "Devices",
            Self::Monitoring => "Monitoring",
            Self::Settings => "Settings",
            Self::Logs => "Logs",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
