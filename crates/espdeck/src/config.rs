//! CLI configuration: thin wrapper around `espdeck_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--endpoint, --timeout, --insecure, ...).

use std::time::Duration;

use espdeck_core::{BridgeConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use espdeck_config::{
    Config, Profile, config_path, load_config, load_config_or_default, parse_endpoint,
    parse_interval, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Build a `BridgeConfig` from the config file, profile, and CLI overrides.
///
/// An explicitly requested profile must exist; otherwise a missing profile
/// is fine as long as `--endpoint` is given.
pub fn build_bridge_config(global: &GlobalOpts) -> Result<BridgeConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: cfg.available_profiles(),
            });
        }
        None => {
            let endpoint = global.endpoint.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?;
            Profile {
                endpoint,
                ..Profile::default()
            }
        }
    };

    resolve_profile(&profile, &cfg, global)
}

/// Translate a `Profile` + global flags into a `BridgeConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<BridgeConfig, CliError> {
    let mut bridge = espdeck_config::profile_to_bridge_config(profile, &cfg.defaults)?;

    // 1. Endpoint (flag > env > profile)
    if let Some(ref endpoint) = global.endpoint {
        bridge.endpoint = parse_endpoint(endpoint)?;
    }

    // 2. TLS
    if global.insecure {
        bridge.tls = TlsVerification::DangerAcceptInvalid;
    }

    // 3. Timing
    if let Some(secs) = global.timeout {
        bridge.timeout = Duration::from_secs(secs);
    }
    if let Some(ref raw) = global.poll_interval {
        bridge.poll_interval = parse_interval("poll-interval", raw)?;
    }

    Ok(bridge)
}
