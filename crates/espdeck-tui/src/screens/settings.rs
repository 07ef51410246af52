//! Settings screen: bridge network details, client settings, restart.

use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use espdeck_core::{BridgeConfig, BridgeStatus, TlsVerification};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct SettingsScreen {
    focused: bool,
    status: Option<Arc<BridgeStatus>>,
    endpoint: String,
    poll_interval: Duration,
    timeout: Duration,
    log_limit: usize,
    tls: &'static str,
}

impl SettingsScreen {
    pub fn new(bridge: &BridgeConfig) -> Self {
        let tls = match bridge.tls {
            TlsVerification::SystemDefaults => "system roots",
            TlsVerification::CustomCa(_) => "custom CA",
            TlsVerification::DangerAcceptInvalid => "unverified",
        };
        Self {
            focused: false,
            status: None,
            endpoint: bridge.endpoint.to_string(),
            poll_interval: bridge.poll_interval,
            timeout: bridge.timeout,
            log_limit: bridge.log_limit,
            tls,
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
}

fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {label:<12}"), Style::default().fg(theme::DIM_WHITE)),
        Span::styled(value, Style::default().fg(theme::NEON_CYAN)),
    ])
}

fn or_dash(value: &str) -> String {
    if value.is_empty() { "─".into() } else { value.to_owned() }
}

impl Component for SettingsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('r' | 'R') => Ok(Some(Action::RequestRestart)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::StatusUpdated(status) = action {
            self.status = Some(Arc::clone(status));
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(7), // network
            Constraint::Length(6), // client
            Constraint::Min(3),    // maintenance
        ])
        .split(area);

        let network = match self.status.as_deref() {
            Some(s) => vec![
                field("Network", or_dash(&s.network_name)),
                field("IP address", or_dash(&s.ip_address)),
                field("MAC", or_dash(&s.mac_address)),
                field("Firmware", or_dash(&s.firmware_version)),
                field("Broker", or_dash(&s.broker_address)),
            ],
            None => vec![Line::from(Span::styled(
                "  Waiting for bridge status…",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ))],
        };
        let block = self.panel("Network");
        let inner = block.inner(layout[0]);
        frame.render_widget(block, layout[0]);
        frame.render_widget(Paragraph::new(network), inner);

        let client = vec![
            field("Endpoint", self.endpoint.clone()),
            field("Poll every", format!("{}ms", self.poll_interval.as_millis())),
            field("Timeout", format!("{}s", self.timeout.as_secs())),
            field("TLS", self.tls.to_owned()),
        ];
        let block = self.panel("Client");
        let inner = block.inner(layout[1]);
        frame.render_widget(block, layout[1]);
        frame.render_widget(Paragraph::new(client), inner);

        let maintenance = vec![
            Line::from(vec![
                Span::styled("  r ", theme::key_hint_key()),
                Span::styled("restart the bridge", theme::key_hint()),
            ]),
            Line::from(Span::styled(
                format!("  Log window: last {} entries", self.log_limit),
                theme::key_hint(),
            )),
        ];
        let block = self.panel("Maintenance");
        let inner = block.inner(layout[2]);
        frame.render_widget(block, layout[2]);
        frame.render_widget(Paragraph::new(maintenance), inner);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::screens::render_to_lines;

    fn bridge() -> BridgeConfig {
        BridgeConfig::new("http://bridge.local/api".parse().unwrap())
            .with_poll_interval(Duration::from_secs(5))
    }

    #[test]
    fn r_requests_restart() {
        let mut screen = SettingsScreen::new(&bridge());
        let action = screen
            .handle_key_event(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::NONE))
            .unwrap();
        assert!(matches!(action, Some(Action::RequestRestart)));
    }

    #[test]
    fn renders_network_and_client_settings() {
        let mut screen = SettingsScreen::new(&bridge());
        screen
            .update(&Action::StatusUpdated(Arc::new(BridgeStatus {
                connected: true,
                uptime: "00:10:00".into(),
                signal_percent: 50,
                memory_percent: 20,
                ip_address: "10.0.0.7".into(),
                mac_address: "24:6F:28:AA:BB:CC".into(),
                firmware_version: "1.4.2".into(),
                network_name: "greenhouse".into(),
                broker_address: String::new(),
            })))
            .unwrap();

        let text = render_to_lines(&screen, 60, 18).join("\n");

        assert!(text.contains("greenhouse"), "{text}");
        assert!(text.contains("10.0.0.7"));
        assert!(text.contains("1.4.2"));
        assert!(text.contains("http://bridge.local/api"));
        assert!(text.contains("5000ms"));
        assert!(text.contains("restart the bridge"));
    }
}
