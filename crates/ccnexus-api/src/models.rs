// Wire types for the host admin API.
//
// Field names are camelCase on the wire. Everything optional on the
// wire stays optional here; defaulting rules belong to the consumer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Response of `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub port: u16,
    #[serde(default)]
    pub endpoints: Vec<WireEndpoint>,
}

/// A configured upstream endpoint as the host reports it.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEndpoint {
    pub name: String,
    pub api_url: String,
    pub api_key: String,
    /// Absent on hosts that predate the enable switch.
    #[serde(default)]
    pub enabled: Option<bool>,
}

// Keep keys out of debug logs.
impl std::fmt::Debug for WireEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireEndpoint")
            .field("name", &self.name)
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Response of `GET /api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub endpoints: HashMap<String, WireEndpointStats>,
}

/// Per-endpoint counters, keyed by endpoint name in [`StatsResponse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEndpointStats {
    #[serde(default)]
    pub requests: u64,
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Body of add and update commands.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointPayload<'a> {
    pub name: &'a str,
    pub api_url: &'a str,
    pub api_key: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct TogglePayload {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct PortPayload {
    pub port: u16,
}
