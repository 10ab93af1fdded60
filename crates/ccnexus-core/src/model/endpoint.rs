// ── Endpoint domain type ──

use secrecy::{ExposeSecret, SecretString};

use crate::reconcile::mask_api_key;

/// A configured upstream target the host may route requests to.
///
/// Endpoints have no stable identifier: they are addressed by their
/// [`Position`](super::Position) in the directory they were read from.
/// `name` doubles as the telemetry join key.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub api_url: String,
    pub api_key: SecretString,
    pub enabled: bool,
}

impl Endpoint {
    /// The key as it may be shown on screen.
    pub fn masked_key(&self) -> String {
        mask_api_key(self.api_key.expose_secret())
    }

    /// Whether two endpoints occupy a position interchangeably. Keys and
    /// the enabled flag can change without moving anything.
    pub(crate) fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name && self.api_url == other.api_url
    }
}
