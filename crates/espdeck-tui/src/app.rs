//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use chrono::{DateTime, Utc};
use espdeck_core::{BridgeStatus, Controller, Operation, RefreshKind};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Cadence, Event, TerminalEvents};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::TerminalSession;

const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Refresh failures are shown in the status bar, not as toasts.
const REFRESH_OPERATIONS: [Operation; 3] = [
    Operation::RefreshDevices,
    Operation::RefreshStatus,
    Operation::RefreshLogs,
];

/// Top-level application state and event loop.
pub struct App {
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    controller: Controller,
    data_cancel: CancellationToken,
    /// Latest status snapshot, for the header.
    status: Option<Arc<BridgeStatus>>,
    /// Most recent failure per refresh kind, cleared by the next snapshot.
    refresh_errors: HashMap<Operation, String>,
    /// Poll stamp of the device list last seen; write merges leave it unchanged.
    devices_polled_at: Option<DateTime<Utc>>,
    pending_confirm: Option<ConfirmAction>,
    /// Restart acknowledgement popup; stays until dismissed.
    acknowledgement: Option<String>,
    notification: Option<(Notification, Instant)>,
}

impl App {
    pub fn new(controller: Controller) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let mut screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens(controller.config()).into_iter().collect();

        let active_screen = ScreenId::default();
        if let Some(screen) = screens.get_mut(&active_screen) {
            screen.set_focused(true);
        }

        Self {
            active_screen,
            screens,
            running: true,
            help_visible: false,
            action_tx,
            action_rx,
            controller,
            data_cancel: CancellationToken::new(),
            status: None,
            refresh_errors: HashMap::new(),
            devices_polled_at: None,
            pending_confirm: None,
            acknowledgement: None,
            notification: None,
        }
    }

    /// Run the main event loop until quit. Shuts the controller down
    /// before returning.
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = TerminalSession::start()?;

        let bridge: JoinHandle<()> = tokio::spawn(crate::data_bridge::run_data_bridge(
            self.controller.clone(),
            self.action_tx.clone(),
            self.data_cancel.clone(),
        ));

        let mut events = TerminalEvents::spawn(Cadence::default());

        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;

                if let Action::Render = action {
                    terminal.draw(|frame| self.render(frame))?;
                }
            }
        }

        events.stop().await;
        self.data_cancel.cancel();
        // The bridge task owns the controller shutdown.
        let _ = bridge.await;
        terminal.finish();
        info!("TUI event loop ended");
        Ok(())
    }

    /// Map a key press to an action. Overlays capture input first, then
    /// global keys, then the active screen.
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.acknowledgement.is_some() {
            return Ok(match key.code {
                KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ' | 'q') => {
                    Some(Action::DismissAcknowledgement)
                }
                _ => None,
            });
        }

        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Char('q')) => return Ok(Some(Action::Quit)),
            (KeyModifiers::NONE, KeyCode::Char('?')) => return Ok(Some(Action::ToggleHelp)),
            (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='4')) => {
                let n = u8::try_from(u32::from(c) - u32::from('0')).unwrap_or(0);
                if let Some(screen) = ScreenId::from_number(n) {
                    return Ok(Some(Action::SwitchScreen(screen)));
                }
            }
            (KeyModifiers::NONE, KeyCode::Tab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
            }
            (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                return Ok(Some(Action::SwitchScreen(self.active_screen.prev())));
            }
            _ => {}
        }

        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            return screen.handle_key_event(key);
        }
        Ok(None)
    }

    /// Apply one action to app state and propagate it to components.
    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,

            Action::Render | Action::Resize(..) => {}

            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, created)| created.elapsed() > NOTIFICATION_TTL)
                {
                    self.notification = None;
                }
            }

            Action::SwitchScreen(target) => {
                if *target != self.active_screen {
                    debug!("switching screen: {} → {}", self.active_screen, target);
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(false);
                    }
                    self.active_screen = *target;
                    if let Some(screen) = self.screens.get_mut(&self.active_screen) {
                        screen.set_focused(true);
                    }
                }
            }

            Action::ToggleHelp => self.help_visible = !self.help_visible,

            // Data updates go to ALL screens so they stay in sync
            Action::DevicesUpdated(_)
            | Action::StatusUpdated(_)
            | Action::LogsUpdated(_)
            | Action::LoadingChanged(_) => {
                match action {
                    Action::DevicesUpdated(_) => {
                        let polled_at = self.controller.last_refresh(RefreshKind::Devices);
                        if polled_at != self.devices_polled_at {
                            self.devices_polled_at = polled_at;
                            self.refresh_errors.remove(&Operation::RefreshDevices);
                        }
                    }
                    Action::StatusUpdated(status) => {
                        self.refresh_errors.remove(&Operation::RefreshStatus);
                        self.status = Some(Arc::clone(status));
                    }
                    Action::LogsUpdated(_) => {
                        self.refresh_errors.remove(&Operation::RefreshLogs);
                    }
                    _ => {}
                }
                for screen in self.screens.values_mut() {
                    if let Some(follow_up) = screen.update(action)? {
                        self.action_tx.send(follow_up)?;
                    }
                }
            }

            Action::Diagnostic { operation, message } => {
                if REFRESH_OPERATIONS.contains(operation) {
                    self.refresh_errors.insert(*operation, message.clone());
                } else {
                    self.action_tx.send(Action::Notify(Notification::error(format!(
                        "{operation} failed: {message}"
                    ))))?;
                }
            }

            Action::RestartAcknowledged(message) => {
                self.acknowledgement = Some(message.clone());
            }
            Action::DismissAcknowledgement => self.acknowledgement = None,

            // ── Commands ──────────────────────────────────────────────
            Action::ToggleDevice(id) => {
                let controller = self.controller.clone();
                let id = id.clone();
                tokio::spawn(async move { controller.toggle_device(&id).await });
            }

            Action::SetDeviceValue { id, value } => {
                let controller = self.controller.clone();
                let (id, value) = (id.clone(), *value);
                tokio::spawn(async move { controller.update_device_value(&id, value).await });
            }

            Action::RequestRestart => {
                self.action_tx
                    .send(Action::ShowConfirm(ConfirmAction::RestartBridge {
                        endpoint: self.controller.config().endpoint.to_string(),
                    }))?;
            }

            Action::ShowConfirm(confirm) => self.pending_confirm = Some(confirm.clone()),

            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    self.execute_confirm(confirm)?;
                }
            }

            Action::ConfirmNo => self.pending_confirm = None,

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),
        }
        Ok(())
    }

    fn execute_confirm(&self, confirm: ConfirmAction) -> Result<()> {
        match confirm {
            ConfirmAction::RestartBridge { .. } => {
                let controller = self.controller.clone();
                // Success arrives as a RestartAcknowledged notice.
                tokio::spawn(async move { controller.restart().await });
                self.action_tx
                    .send(Action::Notify(Notification::info("Restart requested…")))?;
            }
        }
        Ok(())
    }

    /// Render the full application frame.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        // Layout: [header] [screen content] [tab bar] [status bar]
        let layout = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_header(frame, layout[0]);
        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, layout[1]);
        }
        self.render_tab_bar(frame, layout[2]);
        self.render_status_bar(frame, layout[3]);

        // Overlays, last = topmost
        if let Some((ref notif, _)) = self.notification {
            render_notification(frame, area, notif);
        }
        if let Some(ref confirm) = self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
        if let Some(ref message) = self.acknowledgement {
            render_acknowledgement(frame, area, message);
        }
        if self.help_visible {
            render_help_overlay(frame, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let indicator = match self.status.as_deref() {
            Some(s) => Span::styled(
                format!("● {}", s.connection_label()),
                Style::default().fg(theme::connection_color(s.connected)),
            ),
            None => Span::styled("◌ WAITING", Style::default().fg(theme::ELECTRIC_YELLOW)),
        };
        let line = Line::from(vec![
            Span::styled(" espdeck ", theme::title_style()),
            indicator,
            Span::styled(
                format!("  {}", self.controller.config().endpoint),
                theme::key_hint(),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .divider(Span::styled(" ", theme::key_hint()))
            .select(self.active_screen.index());
        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let mut spans = Vec::new();

        let age = self.controller.data_age().map(|age| age.num_seconds());
        spans.push(Span::styled(
            match age {
                Some(secs) => format!(" updated {secs}s ago"),
                None => " no data yet".into(),
            },
            theme::key_hint(),
        ));

        if let Some((op, message)) = REFRESH_OPERATIONS
            .iter()
            .find_map(|op| self.refresh_errors.get(op).map(|m| (op, m)))
        {
            spans.push(Span::styled(
                format!("  ✗ {op}: {message}"),
                Style::default().fg(theme::ERROR_RED),
            ));
        }

        spans.extend([
            Span::styled("   ? ", theme::key_hint_key()),
            Span::styled("help  ", theme::key_hint()),
            Span::styled("q ", theme::key_hint_key()),
            Span::styled("quit", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    let x = (area.width.saturating_sub(width)) / 2;
    let y = (area.height.saturating_sub(height)) / 2;
    Rect::new(area.x + x, area.y + y, width, height)
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let text = format!("  {confirm}");
    let width = u16::try_from(text.chars().count() + 4).unwrap_or(u16::MAX).max(40);
    let dialog_area = centered(area, width, 5);

    frame.render_widget(Clear, dialog_area);
    let block = Block::default()
        .title(" Confirm ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::ELECTRIC_YELLOW))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let lines = vec![
        Line::from(Span::styled(text, Style::default().fg(theme::DIM_WHITE))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_acknowledgement(frame: &mut Frame, area: Rect, message: &str) {
    let popup = centered(area, 50, 6);

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(" Bridge ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme::SUCCESS_GREEN))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let lines = vec![
        Line::from(vec![
            Span::styled(" ✓ ", Style::default().fg(theme::SUCCESS_GREEN)),
            Span::styled(message.to_owned(), Style::default().fg(theme::DIM_WHITE)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Enter ", theme::key_hint_key()),
            Span::styled("dismiss", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

/// Bottom-right toast, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
    let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16;

    let x = area.width.saturating_sub(width + 1);
    let y = area.height.saturating_sub(height + 2);
    let toast_area = Rect::new(area.x + x, area.y + y, width, height.min(area.height));

    let (border_color, icon) = match notif.level {
        NotificationLevel::Error => (theme::ERROR_RED, "✗"),
        NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
        NotificationLevel::Info => (theme::NEON_CYAN, "·"),
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(border_color)),
        Span::styled(notif.message.clone(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered(area, 48, 17);

    frame.render_widget(Clear, help_area);
    let block = Block::default()
        .title(" Keyboard Shortcuts ")
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border_focused())
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let row = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {key:<10}"), theme::key_hint_key()),
            Span::styled(what, theme::key_hint()),
        ])
    };
    let help_text = vec![
        row("1-4", "Jump to tab"),
        row("Tab", "Next tab"),
        row("j/k ↑/↓", "Move selection"),
        Line::from(""),
        Line::from(Span::styled("  Devices", Style::default().fg(theme::NEON_CYAN))),
        row("space", "Toggle device"),
        row("+ / -", "Adjust value by 1"),
        row("[ / ]", "Adjust value by 10"),
        Line::from(""),
        Line::from(Span::styled("  Settings", Style::default().fg(theme::NEON_CYAN))),
        row("r", "Restart bridge"),
        Line::from(""),
        row("?", "This help"),
        row("q", "Quit"),
    ];
    frame.render_widget(Paragraph::new(help_text), inner);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use espdeck_core::BridgeConfig;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::screens::buffer_lines;

    fn app() -> App {
        let config = BridgeConfig::new("http://127.0.0.1:9/api/bridge".parse().unwrap());
        App::new(Controller::new(config).unwrap())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    /// Feed `action` and everything it queues through `process_action`.
    fn dispatch(app: &mut App, action: Action) {
        app.process_action(&action).unwrap();
        while let Ok(next) = app.action_rx.try_recv() {
            app.process_action(&next).unwrap();
        }
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        buffer_lines(terminal.backend().buffer()).join("\n")
    }

    fn status(connected: bool) -> Arc<BridgeStatus> {
        Arc::new(BridgeStatus {
            connected,
            uptime: "00:01:00".into(),
            signal_percent: 80,
            memory_percent: 30,
            ip_address: "192.168.1.50".into(),
            mac_address: "AA:BB:CC:DD:EE:FF".into(),
            firmware_version: "1.0.0".into(),
            network_name: "home".into(),
            broker_address: "mqtt.local".into(),
        })
    }

    #[test]
    fn header_follows_status_snapshot() {
        let mut app = app();
        assert!(screen_text(&app).contains("WAITING"));

        dispatch(&mut app, Action::StatusUpdated(status(true)));
        assert!(screen_text(&app).contains("● ONLINE"));

        dispatch(&mut app, Action::StatusUpdated(status(false)));
        assert!(screen_text(&app).contains("● OFFLINE"));
    }

    #[test]
    fn number_keys_switch_tabs() {
        let mut app = app();
        let action = app.handle_key_event(key(KeyCode::Char('4'))).unwrap().unwrap();
        dispatch(&mut app, action);
        assert_eq!(app.active_screen, ScreenId::Logs);

        let action = app.handle_key_event(key(KeyCode::Tab)).unwrap().unwrap();
        dispatch(&mut app, action);
        assert_eq!(app.active_screen, ScreenId::Devices);
    }

    #[test]
    fn restart_waits_for_confirmation() {
        let mut app = app();
        dispatch(&mut app, Action::SwitchScreen(ScreenId::Settings));

        let action = app.handle_key_event(key(KeyCode::Char('r'))).unwrap().unwrap();
        dispatch(&mut app, action);

        let text = screen_text(&app);
        assert!(text.contains("Restart the bridge at http://127.0.0.1:9/api/bridge?"), "{text}");

        // Dialog captures input; global keys are ignored.
        assert!(app.handle_key_event(key(KeyCode::Char('q'))).unwrap().is_none());
        let action = app.handle_key_event(key(KeyCode::Esc)).unwrap().unwrap();
        dispatch(&mut app, action);
        assert!(app.pending_confirm.is_none());
    }

    #[test]
    fn acknowledgement_popup_until_dismissed() {
        let mut app = app();
        dispatch(&mut app, Action::RestartAcknowledged("Restarting bridge".into()));
        assert!(screen_text(&app).contains("Restarting bridge"));

        let action = app.handle_key_event(key(KeyCode::Enter)).unwrap().unwrap();
        dispatch(&mut app, action);
        assert!(!screen_text(&app).contains("Restarting bridge"));
    }

    #[test]
    fn write_diagnostics_toast_and_refresh_diagnostics_stay_in_status_bar() {
        let mut app = app();

        dispatch(
            &mut app,
            Action::Diagnostic {
                operation: Operation::ToggleDevice,
                message: "HTTP 500".into(),
            },
        );
        let toast = app.notification.as_ref().map(|(n, _)| n.clone()).unwrap();
        assert_eq!(toast, Notification::error("toggle_device failed: HTTP 500"));

        app.notification = None;
        dispatch(
            &mut app,
            Action::Diagnostic {
                operation: Operation::RefreshStatus,
                message: "timed out".into(),
            },
        );
        assert!(app.notification.is_none());
        assert!(screen_text(&app).contains("refresh_status: timed out"));

        dispatch(&mut app, Action::StatusUpdated(status(true)));
        assert!(!screen_text(&app).contains("timed out"));
    }

    #[tokio::test]
    async fn device_refresh_error_clears_only_after_a_poll() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("endpoint", "devices"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"devices":[{"id":"1","name":"Lamp","type":"light","status":true,"icon":"Lightbulb","value":50}]}"#,
            ))
            .mount(&server)
            .await;
        let config = BridgeConfig::new(format!("{}/bridge", server.uri()).parse().unwrap());
        let controller = Controller::new(config).unwrap();
        let mut app = App::new(controller.clone());
        let failure = || Action::Diagnostic {
            operation: Operation::RefreshDevices,
            message: "HTTP 503".into(),
        };

        dispatch(&mut app, failure());
        dispatch(&mut app, Action::DevicesUpdated(controller.devices_snapshot()));
        assert!(screen_text(&app).contains("refresh_devices: HTTP 503"));

        controller.try_refresh_devices().await.unwrap();
        dispatch(&mut app, Action::DevicesUpdated(controller.devices_snapshot()));
        assert!(!screen_text(&app).contains("HTTP 503"));

        dispatch(&mut app, failure());
        dispatch(&mut app, Action::DevicesUpdated(controller.devices_snapshot()));
        assert!(screen_text(&app).contains("refresh_devices: HTTP 503"));
    }
}
