// ── Core error types ──
//
// User-facing errors from ccnexus-core. Consumers never see transport
// errors directly: the `From<ccnexus_api::Error>` impl folds them into the
// console's four failure kinds (unavailable, parse, validation, command)
// plus the position guards.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Host availability ────────────────────────────────────────────
    /// The host integration is missing or not answering.
    #[error("Backend unavailable at {url}: {reason}")]
    BackendUnavailable { url: String, reason: String },

    #[error("Console is not connected")]
    NotConnected,

    // ── Data errors ──────────────────────────────────────────────────
    /// The host answered with a payload that does not decode.
    #[error("Malformed host response: {message}")]
    Parse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// Rejected locally before anything was sent to the host.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The host rejected a command. `message` is the host's own text.
    #[error("{message}")]
    Command {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    /// The position was read from a directory layout that has since been
    /// replaced; the endpoint it named may have moved.
    #[error("Endpoint #{index} refers to an outdated endpoint list; refresh and try again")]
    StalePosition { index: usize },

    #[error("No endpoint at #{index} (the list has {len})")]
    PositionOutOfRange { index: usize, len: usize },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            message: message.into(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    /// Errors raised before any host call was made.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::StalePosition { .. } | Self::PositionOutOfRange { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ccnexus_api::Error> for CoreError {
    fn from(err: ccnexus_api::Error) -> Self {
        match err {
            ccnexus_api::Error::Unavailable { url, reason } => {
                CoreError::BackendUnavailable { url, reason }
            }
            // Anything that kept the request from completing means the
            // host did not answer.
            ccnexus_api::Error::Transport(e) => CoreError::BackendUnavailable {
                url: e.url().map(ToString::to_string).unwrap_or_default(),
                reason: e.to_string(),
            },
            ccnexus_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ccnexus_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            ccnexus_api::Error::InvalidToken(msg) => CoreError::Config {
                message: format!("Invalid admin token: {msg}"),
            },
            ccnexus_api::Error::Command { status, message } => CoreError::Command {
                message,
                status: Some(status),
            },
            ccnexus_api::Error::Deserialization { message, .. } => CoreError::Parse { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_is_verbatim() {
        let err = CoreError::from(ccnexus_api::Error::Command {
            status: 409,
            message: "endpoint name already exists".into(),
        });
        assert_eq!(err.to_string(), "endpoint name already exists");
    }

    #[test]
    fn deserialization_becomes_parse() {
        let err = CoreError::from(ccnexus_api::Error::Deserialization {
            message: "expected u16".into(),
            body: "{}".into(),
        });
        assert!(matches!(err, CoreError::Parse { .. }));
    }

    #[test]
    fn unavailable_is_flagged() {
        let err = CoreError::from(ccnexus_api::Error::Unavailable {
            url: "http://127.0.0.1:3000/".into(),
            reason: "Connection refused".into(),
        });
        assert!(err.is_unavailable());
        assert!(!err.is_local());
    }
}
