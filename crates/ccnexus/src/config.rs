//! CLI configuration: a thin wrapper around `ccnexus_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--host, --token, etc.).

use std::time::Duration;

use secrecy::SecretString;

use ccnexus_core::{ConsoleConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use ccnexus_config::{
    Config, Profile, config_path, load_config, parse_host, save_config, store_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Comma-separated profile names for diagnostics.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        "(none)".into()
    } else {
        config.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

/// Build a `ConsoleConfig` from the config file, profile, and CLI overrides.
///
/// Flags beat the profile; the profile beats built-in defaults. Without a
/// profile, `--host` alone is enough for a host that needs no token.
pub fn resolve_console_config(global: &GlobalOpts) -> Result<ConsoleConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut console = match (cfg.profiles.get(&profile_name), global.host.as_deref()) {
        (Some(_), None) => cfg.console_config(&profile_name)?,
        (Some(_), Some(host)) => {
            let mut c = cfg.console_config(&profile_name)?;
            c.url = parse_host(host, &profile_name)?;
            c
        }
        (None, Some(host)) => {
            let mut c = ConsoleConfig::new(parse_host(host, "--host")?);
            c.timeout = cfg.defaults.timeout.map(Duration::from_secs);
            c
        }
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ref token) = global.token {
        console.token = Some(SecretString::from(token.clone()));
    }
    if global.insecure {
        console.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        console.timeout = Some(Duration::from_secs(secs));
    }

    // One request-response cycle per invocation; no background polling.
    console.telemetry_interval = Duration::ZERO;
    console.directory_interval = Duration::ZERO;

    Ok(console)
}
