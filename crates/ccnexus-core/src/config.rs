// ── Runtime console configuration ──
//
// These types describe *how* to reach a ccNexus host and how often to
// poll it. They carry the admin token but never touch disk. The CLI/TUI
// constructs a `ConsoleConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Default telemetry poll cadence.
pub const DEFAULT_TELEMETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Default directory refresh cadence. Matches the telemetry poll so the
/// endpoint list is as fresh as the counters shown next to it.
pub const DEFAULT_DIRECTORY_INTERVAL: Duration = Duration::from_secs(5);

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for one console session against a single host.
///
/// Built by CLI/TUI, passed to `Console` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Host admin URL (e.g., `http://127.0.0.1:3000`).
    pub url: Url,
    /// Optional admin bearer token.
    pub token: Option<SecretString>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout. `None` leaves timeouts to the host.
    pub timeout: Option<Duration>,
    /// Telemetry poll cadence. Zero disables the poll task.
    pub telemetry_interval: Duration,
    /// Directory refresh cadence. Zero disables the refresh task.
    pub directory_interval: Duration,
    /// Reject mutations addressed with a position from a superseded
    /// directory layout. When off, only the range check runs.
    pub strict_positions: bool,
}

impl ConsoleConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            token: None,
            tls: TlsVerification::default(),
            timeout: None,
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
            directory_interval: DEFAULT_DIRECTORY_INTERVAL,
            strict_positions: true,
        }
    }
}
