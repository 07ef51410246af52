//! Monitoring screen: connectivity, uptime, signal and memory gauges.

use std::sync::Arc;

use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph};

use espdeck_core::{BridgeStatus, Device};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct MonitoringScreen {
    focused: bool,
    status: Option<Arc<BridgeStatus>>,
    devices: Arc<Vec<Arc<Device>>>,
}

impl MonitoringScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            status: None,
            devices: Arc::new(Vec::new()),
        }
    }

    fn panel(&self, title: &str) -> Block<'static> {
        Block::default()
            .title(format!(" {title} "))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            })
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect, status: &BridgeStatus) {
        let label_style = Style::default().fg(theme::DIM_WHITE);
        let active = self.devices.iter().filter(|d| d.status).count();
        let lines = vec![
            Line::from(vec![
                Span::styled("  Connection  ", label_style),
                Span::styled(
                    format!("● {}", status.connection_label()),
                    Style::default().fg(theme::connection_color(status.connected)),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Uptime      ", label_style),
                Span::styled(status.uptime.clone(), Style::default().fg(theme::NEON_CYAN)),
            ]),
            Line::from(vec![
                Span::styled("  Network     ", label_style),
                Span::styled(
                    status.network_name.clone(),
                    Style::default().fg(theme::NEON_CYAN),
                ),
            ]),
            Line::from(vec![
                Span::styled("  Devices on  ", label_style),
                Span::styled(
                    format!("{active} of {}", self.devices.len()),
                    Style::default().fg(theme::NEON_CYAN),
                ),
            ]),
        ];
        let block = self.panel("Bridge");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn render_gauge(&self, frame: &mut Frame, area: Rect, title: &str, percent: u8, color: Color) {
        let gauge = Gauge::default()
            .block(self.panel(title))
            .gauge_style(Style::default().fg(color).bg(theme::BG_HIGHLIGHT))
            .percent(u16::from(percent.min(100)))
            .label(format!("{percent}%"));
        frame.render_widget(gauge, area);
    }
}

impl Component for MonitoringScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StatusUpdated(status) => self.status = Some(Arc::clone(status)),
            Action::DevicesUpdated(devices) => self.devices = Arc::clone(devices),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(status) = self.status.as_deref() else {
            let block = self.panel("Monitoring");
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "  Waiting for bridge status…",
                    Style::default().fg(theme::ELECTRIC_YELLOW),
                )),
                inner,
            );
            return;
        };

        let layout = Layout::vertical([
            Constraint::Length(6), // overview
            Constraint::Length(3), // signal
            Constraint::Length(3), // memory
            Constraint::Min(0),
        ])
        .split(area);

        self.render_overview(frame, layout[0], status);
        self.render_gauge(
            frame,
            layout[1],
            "Signal",
            status.signal_percent,
            theme::signal_color(status.signal_percent),
        );
        self.render_gauge(
            frame,
            layout[2],
            "Memory",
            status.memory_percent,
            theme::load_color(status.memory_percent),
        );
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
