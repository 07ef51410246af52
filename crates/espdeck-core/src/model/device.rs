// ── Device domain types ──

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// One `nudged_value` step: a whole unit, same as the bridge UI's slider.
const VALUE_STEP: f64 = 1.0;

/// Device category. Open set: unknown wire tags survive as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceCategory {
    Lighting,
    Climate,
    Security,
    Blinds,
    Audio,
    Outlet,
    Other(String),
}

impl DeviceCategory {
    /// The tag the bridge uses on the wire.
    pub fn as_wire_str(&self) -> &str {
        match self {
            Self::Lighting => "light",
            Self::Climate => "climate",
            Self::Security => "security",
            Self::Blinds => "blinds",
            Self::Audio => "audio",
            Self::Outlet => "outlet",
            Self::Other(raw) => raw,
        }
    }

    // ── View policy ──────────────────────────────────────────────────
    //
    // The synchronization loop never consults these; views use them to
    // bound and label user input.

    /// Accepted value range for this category.
    pub fn value_range(&self) -> RangeInclusive<f64> {
        match self {
            Self::Climate => 16.0..=30.0,
            _ => 0.0..=100.0,
        }
    }

    /// Human label for the numeric value.
    pub fn value_label(&self) -> &'static str {
        match self {
            Self::Climate => "Temperature",
            Self::Lighting => "Brightness",
            Self::Audio => "Volume",
            _ => "Level",
        }
    }

    /// Display unit for the numeric value.
    pub fn value_unit(&self) -> &'static str {
        match self {
            Self::Climate => "°C",
            _ => "%",
        }
    }

    /// Clamp `value` into [`value_range`](Self::value_range).
    pub fn clamp(&self, value: f64) -> f64 {
        let range = self.value_range();
        value.clamp(*range.start(), *range.end())
    }
}

impl From<String> for DeviceCategory {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "light" => Self::Lighting,
            "climate" => Self::Climate,
            "security" => Self::Security,
            "blinds" => Self::Blinds,
            "audio" => Self::Audio,
            "outlet" => Self::Outlet,
            _ => Self::Other(raw),
        }
    }
}

impl From<DeviceCategory> for String {
    fn from(category: DeviceCategory) -> Self {
        match category {
            DeviceCategory::Other(raw) => raw,
            known => known.as_wire_str().to_owned(),
        }
    }
}

impl fmt::Display for DeviceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

/// A controllable device attached to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub category: DeviceCategory,
    /// On/off.
    pub status: bool,
    /// Presentation-only icon reference.
    pub icon: String,
    pub value: Option<f64>,
}

impl Device {
    /// `value` is only meaningful while the device is on.
    pub fn active_value(&self) -> Option<f64> {
        if self.status { self.value } else { None }
    }

    /// `"75%"`, `"22°C"`; `None` when off or valueless.
    pub fn formatted_value(&self) -> Option<String> {
        self.active_value()
            .map(|v| format!("{}{}", format_number(v), self.category.value_unit()))
    }

    /// Next value for a `steps`-sized nudge, clamped to the category range.
    pub fn nudged_value(&self, steps: i32) -> f64 {
        let range = self.category.value_range();
        let current = self.value.unwrap_or(*range.start());
        self.category
            .clamp(current + f64::from(steps) * VALUE_STEP)
    }
}

/// Render without a trailing `.0` for whole numbers.
fn format_number(v: f64) -> String {
    if v.fract().abs() < f64::EPSILON {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(category: DeviceCategory, status: bool, value: Option<f64>) -> Device {
        Device {
            id: "1".into(),
            name: "Test".into(),
            category,
            status,
            icon: String::new(),
            value,
        }
    }

    #[test]
    fn unknown_category_is_preserved() {
        let category = DeviceCategory::from("sprinkler".to_string());
        assert_eq!(category, DeviceCategory::Other("sprinkler".into()));
        assert_eq!(String::from(category), "sprinkler");
    }

    #[test]
    fn climate_policy() {
        let climate = DeviceCategory::Climate;
        assert_eq!(climate.value_range(), 16.0..=30.0);
        assert_eq!(climate.value_label(), "Temperature");
        assert_eq!(climate.value_unit(), "°C");
        assert!((climate.clamp(40.0) - 30.0).abs() < f64::EPSILON);
        assert!((climate.clamp(3.0) - 16.0).abs() < f64::EPSILON);
    }

    #[test]
    fn default_policy() {
        assert_eq!(DeviceCategory::Lighting.value_label(), "Brightness");
        assert_eq!(DeviceCategory::Audio.value_label(), "Volume");
        assert_eq!(DeviceCategory::Blinds.value_label(), "Level");
        assert_eq!(DeviceCategory::Outlet.value_range(), 0.0..=100.0);
        assert_eq!(DeviceCategory::Other("x".into()).value_unit(), "%");
    }

    #[test]
    fn value_hidden_while_off() {
        let off = device(DeviceCategory::Lighting, false, Some(75.0));
        assert_eq!(off.active_value(), None);
        assert_eq!(off.formatted_value(), None);

        let on = device(DeviceCategory::Lighting, true, Some(75.0));
        assert_eq!(on.formatted_value().as_deref(), Some("75%"));

        let heat = device(DeviceCategory::Climate, true, Some(21.5));
        assert_eq!(heat.formatted_value().as_deref(), Some("21.5°C"));
    }

    #[test]
    fn nudge_stays_in_range() {
        let lamp = device(DeviceCategory::Lighting, true, Some(98.0));
        assert!((lamp.nudged_value(1) - 100.0).abs() < f64::EPSILON);

        let thermostat = device(DeviceCategory::Climate, true, None);
        assert!((thermostat.nudged_value(-1) - 16.0).abs() < f64::EPSILON);

        let lamp = device(DeviceCategory::Lighting, true, Some(75.0));
        assert!((lamp.nudged_value(1) - 76.0).abs() < f64::EPSILON);
        assert!((lamp.nudged_value(-10) - 65.0).abs() < f64::EPSILON);
    }
}
