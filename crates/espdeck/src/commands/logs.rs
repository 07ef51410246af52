//! Command journal handler.

use std::sync::Arc;

use tabled::Tabled;

use espdeck_core::{BridgeConfig, Controller, LogEntry, LogLevel};

use crate::cli::{GlobalOpts, LevelFilter, LogsArgs};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Request")]
    request: String,
}

impl From<&Arc<LogEntry>> for LogRow {
    fn from(entry: &Arc<LogEntry>) -> Self {
        Self {
            time: entry.time_of_day().map_or_else(
                || entry.timestamp.clone(),
                |t| t.format("%H:%M:%S").to_string(),
            ),
            level: entry.level.to_string(),
            action: entry.action.clone(),
            device: entry
                .device_name
                .clone()
                .or_else(|| entry.device_id.clone())
                .unwrap_or_else(|| "-".into()),
            message: entry.message.clone(),
            request: entry.short_request_id().to_owned(),
        }
    }
}

impl From<LevelFilter> for LogLevel {
    fn from(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::Info => LogLevel::Info,
            LevelFilter::Success => LogLevel::Success,
            LevelFilter::Warning => LogLevel::Warning,
            LevelFilter::Error => LogLevel::Error,
        }
    }
}

pub async fn handle(
    bridge: BridgeConfig,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bridge = match args.limit {
        Some(limit) => bridge.with_log_limit(limit),
        None => bridge,
    };

    let logs = Controller::oneshot(bridge, |c| async move {
        c.try_refresh_logs().await?;
        Ok(c.logs_snapshot())
    })
    .await?;

    // Bridge order is preserved; filtering never reorders.
    let wanted = args.level.map(LogLevel::from);
    let entries: Vec<Arc<LogEntry>> = logs
        .iter()
        .filter(|e| wanted.is_none_or(|level| e.level == level))
        .cloned()
        .collect();

    let out = output::render_list(
        global.output,
        &entries,
        |e| LogRow::from(e),
        |e| format!("{} {} {}", e.timestamp, e.level, e.message),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
