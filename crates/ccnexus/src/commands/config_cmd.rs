//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking the plaintext token.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    if let Some(timeout) = cfg.defaults.timeout {
        let _ = writeln!(out, "timeout = {timeout}");
    }
    let _ = writeln!(out, "telemetry_interval = {}", cfg.defaults.telemetry_interval);
    let _ = writeln!(out, "directory_interval = {}", cfg.defaults.directory_interval);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "host = \"{}\"", p.host);
        if p.token.is_some() {
            let _ = writeln!(out, "token = \"****\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = writeln!(out, "token_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(interval) = p.telemetry_interval {
            let _ = writeln!(out, "telemetry_interval = {interval}");
        }
        if let Some(strict) = p.strict_positions {
            let _ = writeln!(out, "strict_positions = {strict}");
        }
    }

    out.trim_end().to_owned()
}

/// Serializable copy with the plaintext token masked.
fn redacted(cfg: &Config) -> Config {
    let mut copy = cfg.clone();
    for profile in copy.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
    copy
}

fn parse_flag<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `config set <key> <value>` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "host" => {
            config::parse_host(&value, "config set")?;
            profile.host = value;
        }
        "token" => profile.token = Some(value),
        "token_env" | "token-env" => profile.token_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_flag(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_flag(key, &value, "a number (seconds)")?),
        "telemetry_interval" | "telemetry-interval" => {
            profile.telemetry_interval = Some(parse_flag(key, &value, "a number (seconds)")?);
        }
        "strict_positions" | "strict-positions" => {
            profile.strict_positions = Some(parse_flag(key, &value, "'true' or 'false'")?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: host, token, token_env, \
                     ca_cert, insecure, timeout, telemetry_interval, strict_positions"
                ),
            });
        }
    }
    Ok(())
}

/// Offer to store the token in the system keyring or return it for plaintext config.
///
/// Returns `Some(token)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_token_storage(token: String, profile_name: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the admin token?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_token(profile_name, &SecretString::from(token))?;
        eprintln!("   ✓ Token stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(token))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("✨ ccNexus console — configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let host: String = Input::new()
                .with_prompt("ccNexus admin URL")
                .default("http://127.0.0.1:3000".into())
                .validate_with(|input: &String| {
                    config::parse_host(input, "init")
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .interact_text()
                .map_err(prompt_err)?;

            let token = rpassword::prompt_password("Admin token (leave empty for none): ")
                .map_err(prompt_err)?;
            let token = if token.trim().is_empty() {
                None
            } else {
                prompt_token_storage(token.trim().to_owned(), &profile_name)?
            };

            // Keep other profiles when re-running init.
            let mut cfg = config::load_config().unwrap_or_default();
            let mut profile = Profile::new(host);
            profile.token = token;
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());

            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: ccnexus endpoints list");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(
                global.output,
                &redacted(&cfg),
                format_config_redacted,
                |_| config::config_path().display().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            if cfg.default_profile.is_none() {
                cfg.default_profile = Some(profile_name.clone());
            }
            config::save_config(&cfg)?;
            output::notice(&format!("✓ Set {key} on profile '{profile_name}'"), global.quiet);
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: ccnexus config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.host);
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }

            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            output::notice(&format!("✓ Default profile set to '{name}'"), global.quiet);
            Ok(())
        }

        // ── SetToken ────────────────────────────────────────────────
        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: config::available_profiles(&cfg),
                });
            }

            let token = rpassword::prompt_password("Admin token: ").map_err(prompt_err)?;
            if token.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            config::store_token(&profile_name, &SecretString::from(token.trim().to_owned()))?;

            output::notice(
                &format!("✓ Token stored in system keyring for profile '{profile_name}'"),
                global.quiet,
            );
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_unknown_key() {
        let mut profile = Profile::default();
        let err = set_profile_key(&mut profile, "site", "x".into()).unwrap_err();
        assert!(err.to_string().contains("site"));
    }

    #[test]
    fn set_parses_typed_values() {
        let mut profile = Profile::default();
        set_profile_key(&mut profile, "timeout", "15".into()).unwrap();
        set_profile_key(&mut profile, "strict-positions", "false".into()).unwrap();
        assert_eq!(profile.timeout, Some(15));
        assert_eq!(profile.strict_positions, Some(false));
        assert!(set_profile_key(&mut profile, "insecure", "maybe".into()).is_err());
    }

    #[test]
    fn show_masks_token() {
        let mut cfg = Config::default();
        let mut profile = Profile::new("http://127.0.0.1:3000");
        profile.token = Some("secret-token".into());
        cfg.profiles.insert("home".into(), profile);

        let text = format_config_redacted(&cfg);
        assert!(text.contains("token = \"****\""));
        assert!(!text.contains("secret-token"));
        assert_eq!(redacted(&cfg).profiles["home"].token.as_deref(), Some("****"));
    }
}
