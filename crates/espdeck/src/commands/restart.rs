//! Bridge restart handler.

use espdeck_core::{BridgeConfig, Command as CoreCommand, CommandResult, Controller};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::util;

pub async fn handle(bridge: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let prompt = format!("Restart the bridge at {}?", bridge.endpoint);
    if !util::confirm(&prompt, "restart", global.yes)? {
        return Ok(());
    }

    let result =
        Controller::oneshot(bridge, |c| async move { c.execute(CoreCommand::Restart).await })
            .await?;

    if let CommandResult::Restarted { message } = result {
        if !global.quiet {
            eprintln!("✓ {message}");
        }
    }
    Ok(())
}
