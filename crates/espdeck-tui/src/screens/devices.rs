//! Devices screen: device table with toggle and value nudging.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use espdeck_core::{BridgeStatus, Device};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;

const BAR_WIDTH: usize = 10;
/// Steps per PageUp/PageDown (or `]`/`[`) nudge.
const COARSE_STEPS: i32 = 10;

pub struct DevicesScreen {
    focused: bool,
    devices: Arc<Vec<Arc<Device>>>,
    status: Option<Arc<BridgeStatus>>,
    loading: bool,
    table_state: TableState,
}

impl DevicesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            devices: Arc::new(Vec::new()),
            status: None,
            loading: true,
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn selected_device(&self) -> Option<&Arc<Device>> {
        self.devices.get(self.table_state.selected().unwrap_or(0))
    }

    fn move_selection(&mut self, down: bool) {
        if self.devices.is_empty() {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0);
        let last = self.devices.len() - 1;
        let next = if down {
            (current + 1).min(last)
        } else {
            current.saturating_sub(1)
        };
        self.table_state.select(Some(next));
    }

    /// Keep the cursor on a row that exists after a snapshot swap.
    fn clamp_selection(&mut self) {
        let last = self.devices.len().saturating_sub(1);
        let current = self.table_state.selected().unwrap_or(0);
        self.table_state.select(Some(current.min(last)));
    }

    fn nudge(&self, steps: i32) -> Option<Action> {
        let device = self.selected_device()?;
        if device.active_value().is_none() {
            let reason = if device.status {
                format!("{} has no adjustable value", device.name)
            } else {
                format!("Turn {} on to adjust it", device.name)
            };
            return Some(Action::Notify(Notification::info(reason)));
        }
        Some(Action::SetDeviceValue {
            id: device.id.clone(),
            value: device.nudged_value(steps),
        })
    }

    fn summary_line(&self) -> Line<'static> {
        let active = self.devices.iter().filter(|d| d.status).count();
        let mut spans = vec![
            Span::styled(
                format!("  {active}/{} on", self.devices.len()),
                Style::default().fg(theme::NEON_CYAN),
            ),
        ];
        if let Some(ref s) = self.status {
            spans.extend([
                Span::styled("   signal ", theme::key_hint()),
                Span::styled(
                    format!("{}%", s.signal_percent),
                    Style::default().fg(theme::signal_color(s.signal_percent)),
                ),
                Span::styled("   memory ", theme::key_hint()),
                Span::styled(
                    format!("{}%", s.memory_percent),
                    Style::default().fg(theme::load_color(s.memory_percent)),
                ),
                Span::styled("   up ", theme::key_hint()),
                Span::styled(s.uptime.clone(), Style::default().fg(theme::DIM_WHITE)),
            ]);
        }
        Line::from(spans)
    }

    fn device_row(device: &Device) -> Row<'static> {
        let (state, state_color) = if device.status {
            ("● on", theme::SUCCESS_GREEN)
        } else {
            ("○ off", theme::BORDER_GRAY)
        };
        let value = match device.active_value() {
            Some(v) => {
                let range = device.category.value_range();
                let span = range.end() - range.start();
                let ratio = if span > 0.0 {
                    ((v - range.start()) / span).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::as_conversions
                )]
                let filled = (ratio * BAR_WIDTH as f64).round() as usize;
                format!(
                    "{}{} {}",
                    "█".repeat(filled),
                    "░".repeat(BAR_WIDTH - filled),
                    device.formatted_value().unwrap_or_default()
                )
            }
            None => "─".into(),
        };

        Row::new(vec![
            Cell::from(device.name.clone()),
            Cell::from(device.category.to_string()),
            Cell::from(Span::styled(state, Style::default().fg(state_color))),
            Cell::from(value),
        ])
        .style(theme::table_row())
    }
}

impl Component for DevicesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(true);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(false);
                Ok(None)
            }
            KeyCode::Char(' ') | KeyCode::Enter => Ok(self
                .selected_device()
                .map(|d| Action::ToggleDevice(d.id.clone()))),
            KeyCode::Char('+' | '=' | 'l') | KeyCode::Right => Ok(self.nudge(1)),
            KeyCode::Char('-' | 'h') | KeyCode::Left => Ok(self.nudge(-1)),
            KeyCode::Char(']') | KeyCode::PageUp => Ok(self.nudge(COARSE_STEPS)),
            KeyCode::Char('[') | KeyCode::PageDown => Ok(self.nudge(-COARSE_STEPS)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::DevicesUpdated(devices) => {
                self.devices = Arc::clone(devices);
                self.clamp_selection();
            }
            Action::StatusUpdated(status) => self.status = Some(Arc::clone(status)),
            Action::LoadingChanged(loading) => self.loading = *loading,
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Devices ({}) ", self.devices.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.loading && self.devices.is_empty() {
            let placeholder = Paragraph::new(Line::from(Span::styled(
                "  Loading devices…",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            )));
            frame.render_widget(placeholder, inner);
            return;
        }

        let layout = Layout::vertical([
            Constraint::Length(1), // summary
            Constraint::Length(1), // spacer
            Constraint::Min(1),    // table
            Constraint::Length(1), // hints
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(self.summary_line()), layout[0]);

        if self.devices.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No devices reported", theme::key_hint())),
                layout[2],
            );
        } else {
            let header = Row::new(["Name", "Type", "State", "Value"]).style(theme::table_header());
            let rows: Vec<Row> = self.devices.iter().map(|d| Self::device_row(d)).collect();
            let table = Table::new(
                rows,
                [
                    Constraint::Fill(2),
                    Constraint::Length(10),
                    Constraint::Length(7),
                    Constraint::Fill(2),
                ],
            )
            .header(header)
            .row_highlight_style(theme::table_selected())
            .highlight_symbol("▸ ");

            let mut state = self.table_state;
            frame.render_stateful_widget(table, layout[2], &mut state);
        }

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("select  ", theme::key_hint()),
            Span::styled("space ", theme::key_hint_key()),
            Span::styled("toggle  ", theme::key_hint()),
            Span::styled("+/- ", theme::key_hint_key()),
            Span::styled("adjust  ", theme::key_hint()),
            Span::styled("[/] ", theme::key_hint_key()),
            Span::styled("by 10", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[3]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use crossterm::event::KeyModifiers;
    use espdeck_core::DeviceCategory;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::screens::render_to_lines;

    fn device(
        id: &str,
        name: &str,
        category: DeviceCategory,
        status: bool,
        value: Option<f64>,
    ) -> Arc<Device> {
        Arc::new(Device {
            id: id.into(),
            name: name.into(),
            category,
            status,
            icon: "bulb".into(),
            value,
        })
    }

    fn loaded_screen() -> DevicesScreen {
        let mut screen = DevicesScreen::new();
        let devices = Arc::new(vec![
            device("1", "Living Room Light", DeviceCategory::Lighting, true, Some(75.0)),
            device("2", "Thermostat", DeviceCategory::Climate, false, Some(22.0)),
            device("3", "Front Door", DeviceCategory::Security, true, None),
        ]);
        screen.update(&Action::LoadingChanged(false)).unwrap();
        screen.update(&Action::DevicesUpdated(devices)).unwrap();
        screen
    }

    fn press(screen: &mut DevicesScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn shows_placeholder_until_first_load() {
        let screen = DevicesScreen::new();
        let lines = render_to_lines(&screen, 60, 6);
        assert!(lines.iter().any(|l| l.contains("Loading devices")));
    }

    #[test]
    fn renders_rows_and_summary() {
        let mut screen = loaded_screen();
        screen
            .update(&Action::StatusUpdated(Arc::new(BridgeStatus {
                connected: true,
                uptime: "01:02:03".into(),
                signal_percent: 72,
                memory_percent: 41,
                ip_address: "192.168.1.50".into(),
                mac_address: "AA:BB".into(),
                firmware_version: "1.0.0".into(),
                network_name: "home".into(),
                broker_address: "mqtt.local".into(),
            })))
            .unwrap();

        let lines = render_to_lines(&screen, 80, 12);
        let text = lines.join("\n");

        assert!(text.contains("2/3 on"), "{text}");
        assert!(text.contains("signal 72%"));
        assert!(text.contains("up 01:02:03"));
        assert!(text.contains("Living Room Light"));
        assert!(text.contains("75%"));
        // Off devices never show their value.
        let thermostat = lines.iter().find(|l| l.contains("Thermostat")).unwrap();
        assert!(!thermostat.contains("22"));
    }

    #[test]
    fn space_toggles_selected_device() {
        let mut screen = loaded_screen();
        press(&mut screen, KeyCode::Down);

        let action = press(&mut screen, KeyCode::Char(' '));
        assert!(matches!(action, Some(Action::ToggleDevice(ref id)) if id == "2"));
    }

    #[test]
    fn plus_and_minus_step_within_range() {
        let mut screen = loaded_screen();

        match press(&mut screen, KeyCode::Char('+')) {
            Some(Action::SetDeviceValue { id, value }) => {
                assert_eq!(id, "1");
                assert_eq!(value, 76.0);
            }
            other => panic!("unexpected {other:?}"),
        }
        match press(&mut screen, KeyCode::Char('-')) {
            Some(Action::SetDeviceValue { value, .. }) => assert_eq!(value, 74.0),
            other => panic!("unexpected {other:?}"),
        }
        match press(&mut screen, KeyCode::PageUp) {
            Some(Action::SetDeviceValue { value, .. }) => assert_eq!(value, 85.0),
            other => panic!("unexpected {other:?}"),
        }
        match press(&mut screen, KeyCode::Char('[')) {
            Some(Action::SetDeviceValue { value, .. }) => assert_eq!(value, 65.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nudging_an_off_device_only_notifies() {
        let mut screen = loaded_screen();
        press(&mut screen, KeyCode::Down);

        let action = press(&mut screen, KeyCode::Char('+'));
        assert!(matches!(action, Some(Action::Notify(_))));
    }

    #[test]
    fn selection_survives_shrinking_snapshot() {
        let mut screen = loaded_screen();
        press(&mut screen, KeyCode::Down);
        press(&mut screen, KeyCode::Down);

        let shorter = Arc::new(vec![device("1", "Only", DeviceCategory::Outlet, false, None)]);
        screen.update(&Action::DevicesUpdated(shorter)).unwrap();

        assert_eq!(screen.selected_device().map(|d| d.id.as_str()), Some("1"));
    }
}
