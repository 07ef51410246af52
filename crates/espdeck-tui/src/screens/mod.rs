//! Screen implementations. Each screen is a top-level Component.

pub mod devices;
pub mod logs;
pub mod monitoring;
pub mod settings;

use espdeck_core::BridgeConfig;

use crate::component::Component;
use crate::screen::ScreenId;

/// One component per tab.
pub fn create_screens(bridge: &BridgeConfig) -> Vec<(ScreenId, Box<dyn Component>)> {
    vec![
        (ScreenId::Devices, Box::new(devices::DevicesScreen::new())),
        (
            ScreenId::Monitoring,
            Box::new(monitoring::MonitoringScreen::new()),
        ),
        (
            ScreenId::Settings,
            Box::new(settings::SettingsScreen::new(bridge)),
        ),
        (ScreenId::Logs, Box::new(logs::LogsScreen::new())),
    ]
}

/// Render `component` into a `width`x`height` test terminal and return
/// the buffer as one string per row.
#[cfg(test)]
pub fn render_to_lines(component: &dyn Component, width: u16, height: u16) -> Vec<String> {
    use ratatui::{Terminal, backend::TestBackend};

    let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
    terminal
        .draw(|frame| component.render(frame, frame.area()))
        .expect("draw");
    buffer_lines(terminal.backend().buffer())
}

#[cfg(test)]
pub fn buffer_lines(buffer: &ratatui::buffer::Buffer) -> Vec<String> {
    let width = usize::from(buffer.area.width);
    buffer
        .content()
        .chunks(width)
        .map(|row| row.iter().map(ratatui::buffer::Cell::symbol).collect::<String>())
        .collect()
}
