//! Logs screen: the bridge's command journal in bridge order.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};

use espdeck_core::{LogEntry, LogLevel};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct LogsScreen {
    focused: bool,
    entries: Arc<Vec<Arc<LogEntry>>>,
    scroll: usize,
}

impl LogsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            entries: Arc::new(Vec::new()),
            scroll: 0,
        }
    }

    fn entry_line(entry: &LogEntry) -> Line<'static> {
        let color = theme::level_color(entry.level);
        let time = entry
            .time_of_day()
            .map_or_else(|| entry.timestamp.clone(), |t| t.format("%H:%M:%S").to_string());

        let mut spans = vec![
            Span::styled(format!("  {time:<9}"), Style::default().fg(theme::DIM_WHITE)),
            Span::styled(
                format!("{:<8}", entry.level.to_string()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("{:<14}", entry.action),
                Style::default().fg(theme::ELECTRIC_PURPLE),
            ),
        ];
        if let Some(ref name) = entry.device_name {
            spans.push(Span::styled(
                format!("[{name}] "),
                Style::default().fg(theme::CORAL),
            ));
        }
        spans.push(Span::styled(
            entry.message.clone(),
            Style::default().fg(color),
        ));
        spans.push(Span::styled(
            format!("  #{}", entry.short_request_id()),
            theme::key_hint(),
        ));
        Line::from(spans)
    }

    fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|e| e.level == level).count()
    }

    fn summary_line(&self) -> Line<'static> {
        let tally = |level: LogLevel, label: &str| {
            Span::styled(
                format!("{} {label}   ", self.count(level)),
                Style::default().fg(theme::level_color(level)),
            )
        };
        Line::from(vec![
            Span::styled(
                format!("  {} entries   ", self.entries.len()),
                Style::default().fg(theme::DIM_WHITE),
            ),
            tally(LogLevel::Success, "success"),
            tally(LogLevel::Error, "errors"),
        ])
    }
}

impl Component for LogsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let last = self.entries.len().saturating_sub(1);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.scroll = (self.scroll + 1).min(last),
            KeyCode::Char('k') | KeyCode::Up => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Char('g') | KeyCode::Home => self.scroll = 0,
            KeyCode::Char('G') | KeyCode::End => self.scroll = last,
            _ => {}
        }
        Ok(None)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::LogsUpdated(entries) = action {
            self.entries = Arc::clone(entries);
            self.scroll = self.scroll.min(self.entries.len().saturating_sub(1));
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Logs ({}) ", self.entries.len()))
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

        let layout = Layout::vertical([
            Constraint::Length(1), // summary
            Constraint::Length(1), // header
            Constraint::Min(1),    // entries
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(self.summary_line()), layout[0]);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled("  Time     ", theme::table_header()),
                Span::styled("Level   ", theme::table_header()),
                Span::styled("Action        ", theme::table_header()),
                Span::styled("Message", theme::table_header()),
            ])),
            layout[1],
        );

        if self.entries.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No log entries yet", theme::key_hint())),
                layout[2],
            );
            return;
        }

        let visible = usize::from(layout[2].height);
        let lines: Vec<Line> = self
            .entries
            .iter()
            .skip(self.scroll)
            .take(visible)
            .map(|e| Self::entry_line(e))
            .collect();
        frame.render_widget(Paragraph::new(lines), layout[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
