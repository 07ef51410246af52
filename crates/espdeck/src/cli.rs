//! Clap derive structures for the `espdeck` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// espdeck -- control an ESP32 smart-home bridge from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "espdeck",
    version,
    about = "Monitor and control an ESP32 smart-home bridge",
    long_about = "Reads devices, bridge health and the command journal from a\n\
        smart-home bridge, toggles and adjusts devices, and follows the\n\
        bridge live with `espdeck watch`.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Bridge profile to use
    #[arg(long, short = 'p', env = "ESPDECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Bridge endpoint URL (overrides profile)
    #[arg(long, short = 'e', env = "ESPDECK_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "ESPDECK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ESPDECK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "ESPDECK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Poll period for `watch`, e.g. "3s" or "500ms" (overrides profile)
    #[arg(long, env = "ESPDECK_POLL_INTERVAL", global = true)]
    pub poll_interval: Option<String>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, inspect and control devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Show bridge health and network info
    Status,

    /// Show the bridge command journal
    Logs(LogsArgs),

    /// Restart the bridge
    Restart,

    /// Follow the bridge live until Ctrl-C
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Devices ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List,

    /// Get a single device
    Get {
        /// Device ID
        device: String,
    },

    /// Switch a device on or off
    Toggle {
        /// Device ID
        device: String,
    },

    /// Set a device's value (brightness, temperature, volume, ...)
    Set {
        /// Device ID
        device: String,

        /// New value; clamped to the device category's range
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

// ── Logs ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Number of most recent entries to request
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Only show entries at this level
    #[arg(long, short = 'l')]
    pub level: Option<LevelFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LevelFilter {
    Info,
    Success,
    Warning,
    Error,
}

// ── Watch ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll period, e.g. "3s" (overrides --poll-interval and profile)
    #[arg(long, short = 'i')]
    pub interval: Option<String>,

    /// Exit after this many device list updates
    #[arg(long, short = 'c')]
    pub count: Option<usize>,
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Set a value on the active profile
    Set {
        /// Profile key: endpoint, insecure, ca_cert, timeout, poll_interval, log_limit
        key: String,

        /// Value to set
        value: String,
    },
}

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
