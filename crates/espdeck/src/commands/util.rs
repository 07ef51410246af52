//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::sync::Arc;

use espdeck_core::{CommandResult, CoreError, Device};

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin there is nobody to ask, so the
/// operation is refused instead.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Unwrap the device carried by a device-level command result.
pub fn into_device(result: CommandResult) -> Result<Arc<Device>, CoreError> {
    match result {
        CommandResult::Device(device) => Ok(device),
        CommandResult::Restarted { .. } => Err(CoreError::Internal(
            "bridge answered a device command with a restart result".into(),
        )),
    }
}

/// `"-"` for empty strings in detail views.
pub fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}
