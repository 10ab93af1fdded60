//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use ccnexus_core::{Console, EndpointSelector};

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

/// Build a console from flags and profile, and connect it.
///
/// Shows a spinner on an interactive stderr while the initial fetch runs.
pub async fn connect(global: &GlobalOpts) -> Result<Console, CliError> {
    let console = Console::new(config::resolve_console_config(global)?);

    let spinner = spinner(global, "Contacting ccNexus host...");
    let connected = console.connect().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    connected?;

    Ok(console)
}

fn spinner(global: &GlobalOpts, message: &str) -> Option<ProgressBar> {
    if global.quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(80));
    Some(spinner)
}

/// Parse an endpoint index or name from the command line.
pub fn selector(raw: &str) -> Result<EndpointSelector, CliError> {
    Ok(raw.parse::<EndpointSelector>()?)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Refuses to guess on a non-interactive stdin.
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

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}
