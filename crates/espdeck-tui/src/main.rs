//! `espdeck-tui`: live terminal dashboard for an ESP32 smart-home bridge.
//!
//! Built on [ratatui](https://ratatui.rs) over the synchronization loop in
//! `espdeck-core`. Four tabs, selected with `1`-`4` or `Tab`: Devices,
//! Monitoring, Settings and Logs.
//!
//! Logs are written to a file (default `/tmp/espdeck-tui.log`) so they never
//! land on the terminal. A background data bridge starts the controller's
//! poll loop and forwards every snapshot into the TUI action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use espdeck_core::{BridgeConfig, Controller, TlsVerification};

use crate::app::App;

/// Terminal dashboard for an ESP32 smart-home bridge.
#[derive(Parser, Debug)]
#[command(name = "espdeck-tui", version, about)]
struct Cli {
    /// Bridge endpoint URL (e.g., http://192.168.1.100/api/bridge)
    #[arg(short = 'e', long, env = "ESPDECK_ENDPOINT")]
    endpoint: Option<String>,

    /// Config profile to use when no endpoint is given
    #[arg(short = 'p', long, env = "ESPDECK_PROFILE")]
    profile: Option<String>,

    /// Poll interval (e.g., 3s, 500ms)
    #[arg(short = 'i', long, env = "ESPDECK_POLL_INTERVAL")]
    poll_interval: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long, env = "ESPDECK_INSECURE")]
    insecure: bool,

    /// Log file path
    #[arg(long, default_value = "/tmp/espdeck-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing. The returned guard flushes the writer on drop.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("espdeck_tui={log_level},espdeck_core={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("espdeck-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Flags first, then the named or default profile from the config file.
fn build_bridge_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut bridge = match cli.endpoint.as_deref() {
        Some(raw) => BridgeConfig::new(espdeck_config::parse_endpoint(raw)?),
        None => {
            let cfg = espdeck_config::load_config()
                .wrap_err_with(|| format!("reading {}", espdeck_config::config_path().display()))?;
            let name = cli
                .profile
                .as_deref()
                .unwrap_or_else(|| cfg.active_profile_name());
            let profile = cfg.profile(name).map_err(|_| {
                eyre!(
                    "no bridge endpoint configured (profile '{name}'); \
                     pass --endpoint or run `espdeck config init`"
                )
            })?;
            espdeck_config::profile_to_bridge_config(profile, &cfg.defaults)?
        }
    };

    if let Some(raw) = cli.poll_interval.as_deref() {
        bridge = bridge.with_poll_interval(espdeck_config::parse_interval("poll_interval", raw)?);
    }
    if cli.insecure {
        bridge = bridge.with_tls(TlsVerification::DangerAcceptInvalid);
    }
    Ok(bridge)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let bridge = build_bridge_config(&cli)?;
    info!(
        endpoint = %bridge.endpoint,
        poll_interval = ?bridge.poll_interval,
        "starting espdeck-tui"
    );

    let controller = Controller::new(bridge)?;
    let mut app = App::new(controller);
    app.run().await?;

    Ok(())
}
