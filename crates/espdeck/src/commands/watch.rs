//! `watch`: run the synchronization loop and stream changes to stdout.
//!
//! One line per applied snapshot and per notice. Structured output
//! formats emit one compact JSON object per line instead.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use espdeck_core::{BridgeConfig, BridgeStatus, Controller, Device, LogEntry, Notice};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::parse_interval;
use crate::error::CliError;
use crate::output;

/// A single line of `watch` output.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WatchEvent {
    Devices {
        total: usize,
        active: usize,
        devices: Vec<Arc<Device>>,
    },
    Status {
        status: Arc<BridgeStatus>,
    },
    Logs {
        count: usize,
        latest: Option<Arc<LogEntry>>,
    },
    Acknowledged {
        message: String,
    },
    Diagnostic {
        operation: String,
        message: String,
    },
}

impl WatchEvent {
    fn from_devices(devices: &[Arc<Device>]) -> Self {
        Self::Devices {
            total: devices.len(),
            active: devices.iter().filter(|d| d.status).count(),
            devices: devices.to_vec(),
        }
    }

    fn from_logs(logs: &[Arc<LogEntry>]) -> Self {
        Self::Logs {
            count: logs.len(),
            latest: logs.first().cloned(),
        }
    }

    fn from_notice(notice: Notice) -> Self {
        match notice {
            Notice::RestartAcknowledged { message } => Self::Acknowledged { message },
            Notice::Diagnostic { operation, message } => Self::Diagnostic {
                operation: operation.to_string(),
                message,
            },
        }
    }

    fn human(&self, color: bool) -> String {
        match self {
            Self::Devices { total, active, .. } => {
                format!("devices  {total} total, {active} on")
            }
            Self::Status { status } => format!(
                "status   {}  signal {}%  memory {}%  up {}",
                output::connection_tag(status.connected, status.connection_label(), color),
                status.signal_percent,
                status.memory_percent,
                status.uptime
            ),
            Self::Logs { count, latest } => match latest {
                Some(entry) => format!(
                    "logs     {count} entries, latest {} {}",
                    output::level_tag(entry.level, color),
                    entry.message
                ),
                None => format!("logs     {count} entries"),
            },
            Self::Acknowledged { message } => format!("notice   {message}"),
            Self::Diagnostic { operation, message } => {
                format!("error    {operation}: {message}")
            }
        }
    }
}

fn emit(event: &WatchEvent, format: OutputFormat, color: bool, quiet: bool) {
    let line = match format {
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_json_compact(event)
        }
        OutputFormat::Table | OutputFormat::Plain => format!(
            "{}  {}",
            chrono::Local::now().format("%H:%M:%S"),
            event.human(color)
        ),
    };
    output::print_output(&line, quiet);
}

pub async fn handle(
    bridge: BridgeConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let bridge = match args.interval {
        Some(ref raw) => bridge.with_poll_interval(parse_interval("interval", raw)?),
        None => bridge,
    };
    let color = output::should_color(global.color);
    let format = global.output;
    let quiet = global.quiet;

    let controller = Controller::new(bridge)?;
    let mut devices = controller.devices();
    let mut status = controller.status_watch();
    let mut logs = controller.logs();
    let mut notices = controller.notices();

    tracing::info!(
        endpoint = %controller.config().endpoint,
        interval = ?controller.config().poll_interval,
        "watching bridge"
    );
    controller.start().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut device_updates = 0usize;

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,

            Some(snapshot) = devices.changed() => {
                emit(&WatchEvent::from_devices(&snapshot), format, color, quiet);
                device_updates += 1;
                if args.count.is_some_and(|n| device_updates >= n) {
                    break;
                }
            }

            Ok(()) = status.changed() => {
                let current = status.borrow_and_update().clone();
                if let Some(current) = current {
                    emit(&WatchEvent::Status { status: current }, format, color, quiet);
                }
            }

            Some(snapshot) = logs.changed() => {
                emit(&WatchEvent::from_logs(&snapshot), format, color, quiet);
            }

            notice = notices.recv() => match notice {
                Ok(notice) => emit(&WatchEvent::from_notice(notice), format, color, quiet),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notice receiver lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    controller.shutdown().await;
    Ok(())
}
