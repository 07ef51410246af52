//! Bridge status handler.

use std::sync::Arc;

use espdeck_core::{BridgeConfig, BridgeStatus, Controller, CoreError};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util::or_dash;

fn detail(s: &Arc<BridgeStatus>, color: bool) -> String {
    [
        format!(
            "Status:    {}",
            output::connection_tag(s.connected, s.connection_label(), color)
        ),
        format!("Uptime:    {}", or_dash(&s.uptime)),
        format!("Signal:    {}%", s.signal_percent),
        format!("Memory:    {}%", s.memory_percent),
        format!("IP:        {}", or_dash(&s.ip_address)),
        format!("MAC:       {}", or_dash(&s.mac_address)),
        format!("Firmware:  {}", or_dash(&s.firmware_version)),
        format!("Network:   {}", or_dash(&s.network_name)),
        format!("Broker:    {}", or_dash(&s.broker_address)),
    ]
    .join("\n")
}

pub async fn handle(bridge: BridgeConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let status = Controller::oneshot(bridge, |c| async move {
        c.try_refresh_status().await?;
        c.status()
            .ok_or_else(|| CoreError::Internal("status refresh applied no snapshot".into()))
    })
    .await?;

    let color = output::should_color(global.color);
    let out = output::render_single(
        global.output,
        &status,
        |s| detail(s, color),
        |s| s.connection_label().to_owned(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
