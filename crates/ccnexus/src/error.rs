//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and a stable exit code per failure kind.

use miette::Diagnostic;
use thiserror::Error;

use ccnexus_config::ConfigError;
use ccnexus_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const UNAVAILABLE: i32 = 3;
    pub const REJECTED: i32 = 4;
    pub const STALE: i32 = 5;
    pub const CONFIG: i32 = 6;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(dead_code, unused_assignments)]
pub enum CliError {
    // ── Host ─────────────────────────────────────────────────────────

    #[error("ccNexus host at {url} is unavailable: {reason}")]
    #[diagnostic(
        code(ccnexus::unavailable),
        help(
            "Check that ccNexus is running and its admin API is reachable.\n\
             Try: ccnexus --host http://127.0.0.1:3000 stats"
        )
    )]
    Unavailable { url: String, reason: String },

    #[error("{message}")]
    #[diagnostic(code(ccnexus::rejected))]
    Rejected { message: String, status: Option<u16> },

    #[error("Malformed response from host: {message}")]
    #[diagnostic(
        code(ccnexus::parse),
        help("The host answered with data this console does not understand. Check the ccNexus version.")
    )]
    Parse { message: String },

    // ── Positions ────────────────────────────────────────────────────

    #[error("Endpoint #{index} refers to an outdated endpoint list")]
    #[diagnostic(
        code(ccnexus::stale_position),
        help("The endpoint list changed while the command ran. Run: ccnexus endpoints list")
    )]
    StalePosition { index: usize },

    #[error("No endpoint at #{index} (the list has {len})")]
    #[diagnostic(
        code(ccnexus::not_found),
        help("Run: ccnexus endpoints list to see available endpoints")
    )]
    NotFound { index: usize, len: usize },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ccnexus::validation))]
    Validation { field: String, reason: String },

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(ccnexus::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ccnexus::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: ccnexus config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No ccNexus host configured")]
    #[diagnostic(
        code(ccnexus::no_config),
        help(
            "Pass --host http://127.0.0.1:3000, or create a profile with: ccnexus config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ccnexus::config))]
    Config(Box<ConfigError>),

    #[error("Cannot set up the host connection: {message}")]
    #[diagnostic(
        code(ccnexus::setup),
        help("Check --host, --token and the TLS settings (ca_cert, insecure) of your profile.")
    )]
    Setup { message: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(ccnexus::render))]
    Render(String),

    #[error("{0}")]
    #[diagnostic(code(ccnexus::internal))]
    Internal(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => Self::ProfileNotFound {
                name,
                available: "(see: ccnexus config profiles)".into(),
            },
            other => Self::Config(Box::new(other)),
        }
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::Unavailable { .. } => exit_code::UNAVAILABLE,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::StalePosition { .. } | Self::NotFound { .. } => exit_code::STALE,
            Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_)
            | Self::Setup { .. } => exit_code::CONFIG,
            Self::Parse { .. } | Self::Io(_) | Self::Render(_) | Self::Internal(_) => {
                exit_code::GENERAL
            }
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BackendUnavailable { url, reason } => Self::Unavailable { url, reason },
            CoreError::NotConnected => Self::Unavailable {
                url: "(disconnected)".into(),
                reason: "console is not connected".into(),
            },
            CoreError::Parse { message } => Self::Parse { message },
            CoreError::Validation { field, message } => Self::Validation {
                field,
                reason: message,
            },
            CoreError::Command { message, status } => Self::Rejected { message, status },
            CoreError::StalePosition { index } => Self::StalePosition { index },
            CoreError::PositionOutOfRange { index, len } => Self::NotFound { index, len },
            CoreError::Config { message } => Self::Setup { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}
