use thiserror::Error;

/// Top-level error type for the `ccnexus-api` crate.
///
/// Covers every failure mode of the host admin surface: reaching the host,
/// decoding its payloads, and commands the host rejected.
/// `ccnexus-core` maps these into the console's error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The host process could not be reached at all (connection refused,
    /// DNS failure, handshake failure).
    #[error("Host unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    /// Any other HTTP transport failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The admin token cannot be sent as a header value.
    #[error("Invalid admin token: {0}")]
    InvalidToken(String),

    // ── Host ────────────────────────────────────────────────────────
    /// The host answered a command with a non-success status. `message`
    /// carries the response body verbatim.
    #[error("{message}")]
    Command { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the host could not be reached.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Transport(e) => e.is_connect(),
            _ => false,
        }
    }

    /// HTTP status of a rejected command, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Command { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
