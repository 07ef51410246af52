//! Command dispatch: bridges CLI args -> core Controller -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod logs;
pub mod restart;
pub mod status;
pub mod util;
pub mod watch;

use espdeck_core::BridgeConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a bridge-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    bridge: BridgeConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(bridge, args, global).await,
        Command::Status => status::handle(bridge, global).await,
        Command::Logs(args) => logs::handle(bridge, args, global).await,
        Command::Restart => restart::handle(bridge, global).await,
        Command::Watch(args) => watch::handle(bridge, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
