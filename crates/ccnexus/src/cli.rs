//! Clap derive structures for the `ccnexus` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Compiled by `build.rs` as well, so it may only depend on clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ccnexus -- console for a running ccNexus proxy
#[derive(Debug, Parser)]
#[command(
    name = "ccnexus",
    version,
    about = "Manage a ccNexus proxy from the command line",
    long_about = "Manage the upstream endpoints of a running ccNexus proxy, read its\n\
        usage counters and change its listen port.\n\n\
        Talks to the proxy's admin API; nothing is stored locally except\n\
        connection profiles.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Host profile to use
    #[arg(long, short = 'p', env = "CCNEXUS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Admin URL of the ccNexus host (overrides profile)
    #[arg(long, env = "CCNEXUS_HOST", global = true)]
    pub host: Option<String>,

    /// Admin bearer token
    #[arg(long, env = "CCNEXUS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CCNEXUS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CCNEXUS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: none)
    #[arg(long, env = "CCNEXUS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage upstream API endpoints
    #[command(alias = "ep", alias = "e")]
    Endpoints(EndpointsArgs),

    /// Show request and token usage per endpoint
    Stats,

    /// Show or change the proxy listen port
    Port(PortArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENDPOINTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EndpointsArgs {
    #[command(subcommand)]
    pub command: EndpointsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EndpointsCommand {
    /// List endpoints with their usage
    #[command(alias = "ls")]
    List,

    /// Show one endpoint
    Get {
        /// Endpoint index or name
        endpoint: String,
    },

    /// Add an endpoint
    Add {
        /// Display name
        #[arg(long)]
        name: String,

        /// Upstream API base URL
        #[arg(long)]
        api_url: String,

        /// Upstream API key (prompted for when omitted)
        #[arg(long, env = "CCNEXUS_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Change an endpoint; fields not given keep their current value
    Update {
        /// Endpoint index or name
        endpoint: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        api_url: Option<String>,

        #[arg(long)]
        api_key: Option<String>,
    },

    /// Remove an endpoint
    #[command(alias = "rm")]
    Remove {
        /// Endpoint index or name
        endpoint: String,
    },

    /// Enable an endpoint
    Enable {
        /// Endpoint index or name
        endpoint: String,
    },

    /// Disable an endpoint
    Disable {
        /// Endpoint index or name
        endpoint: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PORT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PortArgs {
    #[command(subcommand)]
    pub command: PortCommand,
}

#[derive(Debug, Subcommand)]
pub enum PortCommand {
    /// Show the configured listen port
    Show,

    /// Change the listen port (takes effect after a restart)
    Set {
        /// New port (1-65535)
        port: u32,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (host, token, token_env, ca_cert, insecure, timeout,
        /// telemetry_interval, strict_positions)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an admin token in the system keyring
    SetToken {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
