//! `ccnexus-tui`: live terminal dashboard for a ccNexus proxy.
//!
//! Built on [ratatui](https://ratatui.rs) with reactive data from
//! `ccnexus-core`'s [`DisplayStream`](ccnexus_core::DisplayStream). Two
//! screens, switched with `1`/`2` or Tab: Endpoints (list, add, edit,
//! delete, enable/disable, port) and Usage (per-endpoint counters).
//!
//! Logs go to a file (default `ccnexus-tui.log` in the temp dir) because
//! stdout belongs to the terminal UI.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, bail};
use secrecy::SecretString;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ccnexus_core::{Console, ConsoleConfig, TlsVerification};

use crate::app::App;

/// Terminal dashboard for a ccNexus proxy.
#[derive(Parser, Debug)]
#[command(name = "ccnexus-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "CCNEXUS_PROFILE")]
    profile: Option<String>,

    /// ccNexus admin URL (e.g., http://127.0.0.1:3000), overrides the profile
    #[arg(long, env = "CCNEXUS_HOST")]
    host: Option<String>,

    /// Admin bearer token
    #[arg(long, env = "CCNEXUS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Accept self-signed TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path (defaults to ccnexus-tui.log in the temp dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Writing to stdout/stderr would corrupt the UI.
/// The returned guard flushes pending lines when dropped.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("ccnexus_tui={log_level},ccnexus_core={log_level}"))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("ccnexus-tui.log"));
    let log_dir = log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("ccnexus-tui.log"))
        .to_owned();

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Resolve the console configuration: flags beat the profile.
fn console_config(cli: &Cli) -> Result<ConsoleConfig> {
    let cfg = ccnexus_config::load_config_or_default();
    let profile_name = cfg.active_profile_name(cli.profile.as_deref());

    let mut config = match (cfg.profiles.contains_key(&profile_name), cli.host.as_deref()) {
        (true, None) => cfg.console_config(&profile_name)?,
        (true, Some(host)) => {
            let mut c = cfg.console_config(&profile_name)?;
            c.url = ccnexus_config::parse_host(host, &profile_name)?;
            c
        }
        (false, Some(host)) => ConsoleConfig::new(ccnexus_config::parse_host(host, "--host")?),
        (false, None) if cli.profile.is_some() => {
            bail!("profile '{profile_name}' not found in configuration")
        }
        (false, None) => bail!(
            "no ccNexus host configured; pass --host http://127.0.0.1:3000 \
             or create a profile with `ccnexus config init`"
        ),
    };

    if let Some(ref token) = cli.token {
        config.token = Some(SecretString::from(token.clone()));
    }
    if cli.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched.
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = console_config(&cli)?;
    info!(url = %config.url, "starting ccnexus-tui");

    let mut app = App::new(Console::new(config));
    app.run().await?;

    Ok(())
}
