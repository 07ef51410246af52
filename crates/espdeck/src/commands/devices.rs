//! Device command handlers.

use std::sync::Arc;

use tabled::Tabled;

use espdeck_core::{BridgeConfig, Command as CoreCommand, Controller, Device};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&Arc<Device>> for DeviceRow {
    fn from(d: &Arc<Device>) -> Self {
        Self {
            id: d.id.clone(),
            name: d.name.clone(),
            category: d.category.to_string(),
            state: on_off(d.status).into(),
            value: d.formatted_value().unwrap_or_else(|| "-".into()),
        }
    }
}

fn on_off(status: bool) -> &'static str {
    if status { "on" } else { "off" }
}

fn detail(d: &Arc<Device>) -> String {
    let range = d.category.value_range();
    [
        format!("ID:       {}", d.id),
        format!("Name:     {}", d.name),
        format!("Type:     {}", d.category),
        format!("State:    {}", on_off(d.status)),
        format!(
            "{:<9} {}",
            format!("{}:", d.category.value_label()),
            d.formatted_value().unwrap_or_else(|| "-".into())
        ),
        format!(
            "Range:    {}..={}{}",
            range.start(),
            range.end(),
            d.category.value_unit()
        ),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    bridge: BridgeConfig,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => {
            let devices = Controller::oneshot(bridge, |c| async move {
                c.try_refresh_devices().await?;
                Ok(c.devices_snapshot())
            })
            .await?;
            let out = output::render_list(
                global.output,
                &devices,
                |d| DeviceRow::from(d),
                |d| d.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let found =
                Controller::oneshot(bridge, |c| async move { c.fetch_device(&device).await })
                    .await?;
            let out = output::render_single(global.output, &found, detail, |d| d.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Toggle { device } => {
            let toggled = Controller::oneshot(bridge, |c| async move {
                util::into_device(c.execute(CoreCommand::ToggleDevice { id: device }).await?)
            })
            .await?;
            if !global.quiet {
                eprintln!("✓ {} is now {}", toggled.name, on_off(toggled.status));
            }
            let out = output::render_single(global.output, &toggled, detail, |d| d.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Set { device, value } => {
            if !value.is_finite() {
                return Err(CliError::Validation {
                    field: "value".into(),
                    reason: format!("'{value}' is not a finite number"),
                });
            }

            let color = output::should_color(global.color);
            let quiet = global.quiet;
            let updated = Controller::oneshot(bridge, |c| async move {
                let current = c.fetch_device(&device).await?;
                let clamped = current.category.clamp(value);
                if (clamped - value).abs() > f64::EPSILON {
                    let range = current.category.value_range();
                    output::warn(
                        &format!(
                            "{value} is outside {}..={} for {} devices; sending {clamped}",
                            range.start(),
                            range.end(),
                            current.category
                        ),
                        color,
                        quiet,
                    );
                }
                util::into_device(
                    c.execute(CoreCommand::SetDeviceValue {
                        id: device,
                        value: clamped,
                    })
                    .await?,
                )
            })
            .await?;
            if !global.quiet {
                eprintln!(
                    "✓ {} set to {}",
                    updated.name,
                    updated.formatted_value().unwrap_or_else(|| "-".into())
                );
            }
            let out = output::render_single(global.output, &updated, detail, |d| d.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
