//! Shared configuration for the ccnexus CLI and TUI.
//!
//! TOML profiles, admin token resolution (env + keyring + plaintext),
//! and translation to `ccnexus_core::ConsoleConfig`. Both binaries
//! depend on this crate; the CLI layers its global flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use ccnexus_core::config::{DEFAULT_DIRECTORY_INTERVAL, DEFAULT_TELEMETRY_INTERVAL};
use ccnexus_core::{ConsoleConfig, TlsVerification};

const KEYRING_SERVICE: &str = "ccnexus";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("invalid host URL '{url}' in profile '{profile}': {reason}")]
    InvalidUrl {
        profile: String,
        url: String,
        reason: String,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named host profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds. Unset means no client-side timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Telemetry poll cadence in seconds.
    #[serde(default = "default_interval")]
    pub telemetry_interval: u64,

    /// Directory refresh cadence in seconds.
    #[serde(default = "default_interval")]
    pub directory_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: None,
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL.as_secs(),
            directory_interval: DEFAULT_DIRECTORY_INTERVAL.as_secs(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_interval() -> u64 {
    DEFAULT_TELEMETRY_INTERVAL.as_secs()
}

/// A named ccNexus host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Admin base URL (e.g., "http://127.0.0.1:3000").
    pub host: String,

    /// Admin token (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable name containing the admin token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry_interval: Option<u64>,

    /// Set to `false` to address endpoints by index alone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict_positions: Option<bool>,
}

impl Profile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

impl Config {
    /// The profile to use: an explicit name wins, then `default_profile`,
    /// then `"default"`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }

    /// Build a `ConsoleConfig` for a named profile, falling back to this
    /// file's `[defaults]` for anything the profile leaves unset.
    pub fn console_config(&self, profile_name: &str) -> Result<ConsoleConfig, ConfigError> {
        let profile = self.profile(profile_name)?;
        build_console_config(profile, profile_name, &self.defaults)
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "ccnexus").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ccnexus");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Layering: built-in defaults, then the TOML file, then `CCNEXUS_*`
/// environment variables (`__` separates nested keys, e.g.
/// `CCNEXUS_DEFAULTS__OUTPUT=json`).
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CCNEXUS_").split("__"))
}

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist or is invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
}

/// Resolve the admin token for a profile.
///
/// Order: the env var named by `token_env`, the system keyring, then the
/// plaintext `token`. `None` means the host is used without auth.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    profile.token.clone().map(SecretString::from)
}

/// Store a profile's admin token in the system keyring.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

// ── ConsoleConfig translation ───────────────────────────────────────

/// Build a `ConsoleConfig` from a profile with no CLI flag overrides.
///
/// Unset intervals use the core defaults; no timeout unless the profile
/// sets one.
pub fn profile_to_console_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ConsoleConfig, ConfigError> {
    build_console_config(profile, profile_name, &Defaults::default())
}

fn build_console_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let url = parse_host(&profile.host, profile_name)?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = ConsoleConfig::new(url);
    config.token = resolve_token(profile, profile_name);
    config.tls = tls;
    config.timeout = profile
        .timeout
        .or(defaults.timeout)
        .map(Duration::from_secs);
    config.telemetry_interval =
        Duration::from_secs(profile.telemetry_interval.unwrap_or(defaults.telemetry_interval));
    config.directory_interval = Duration::from_secs(defaults.directory_interval);
    config.strict_positions = profile.strict_positions.unwrap_or(true);
    Ok(config)
}

/// Parse and check a host URL. Only `http` and `https` are accepted.
pub fn parse_host(raw: &str, profile_name: &str) -> Result<url::Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        profile: profile_name.into(),
        url: raw.into(),
        reason,
    };
    let url = url::Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}
