// ── Wire → domain conversion ──
//
// The only place wire types are read. The `enabled` defaulting rule
// (missing means enabled) lives here and nowhere else.

use chrono::Utc;
use secrecy::SecretString;

use ccnexus_api::{ConfigResponse, StatsResponse, WireEndpoint, WireEndpointStats};

use crate::error::CoreError;
use crate::model::{DirectorySnapshot, Endpoint, EndpointStats, TelemetrySnapshot};

impl From<WireEndpoint> for Endpoint {
    fn from(wire: WireEndpoint) -> Self {
        Self {
            name: wire.name,
            api_url: wire.api_url,
            api_key: SecretString::from(wire.api_key),
            enabled: wire.enabled.unwrap_or(true),
        }
    }
}

impl From<WireEndpointStats> for EndpointStats {
    fn from(wire: WireEndpointStats) -> Self {
        Self {
            requests: wire.requests,
            errors: wire.errors,
            input_tokens: wire.input_tokens,
            output_tokens: wire.output_tokens,
        }
    }
}

/// Build an unversioned directory snapshot. The store assigns the version
/// when the snapshot is applied.
pub fn directory_from_wire(resp: ConfigResponse) -> Result<DirectorySnapshot, CoreError> {
    if resp.port == 0 {
        return Err(CoreError::Parse {
            message: "host reported listen port 0".into(),
        });
    }

    Ok(DirectorySnapshot {
        version: 0,
        port: resp.port,
        endpoints: resp.endpoints.into_iter().map(Endpoint::from).collect(),
        fetched_at: Utc::now(),
    })
}

pub fn telemetry_from_wire(resp: StatsResponse) -> TelemetrySnapshot {
    TelemetrySnapshot {
        total_requests: resp.total_requests,
        endpoints: resp
            .endpoints
            .into_iter()
            .map(|(name, stats)| (name, EndpointStats::from(stats)))
            .collect(),
        fetched_at: Utc::now(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn wire(enabled: Option<bool>) -> WireEndpoint {
        serde_json::from_value(match enabled {
            Some(flag) => serde_json::json!({
                "name": "A", "apiUrl": "x", "apiKey": "k", "enabled": flag
            }),
            None => serde_json::json!({ "name": "A", "apiUrl": "x", "apiKey": "k" }),
        })
        .unwrap()
    }

    #[test]
    fn missing_enabled_defaults_to_true() {
        assert!(Endpoint::from(wire(None)).enabled);
        assert!(Endpoint::from(wire(Some(true))).enabled);
        assert!(!Endpoint::from(wire(Some(false))).enabled);
    }

    #[test]
    fn zero_port_is_a_parse_error() {
        let resp: ConfigResponse =
            serde_json::from_value(serde_json::json!({ "port": 0, "endpoints": [] })).unwrap();
        assert!(matches!(directory_from_wire(resp), Err(CoreError::Parse { .. })));
    }

    #[test]
    fn telemetry_keeps_names() {
        let resp: StatsResponse = serde_json::from_value(serde_json::json!({
            "totalRequests": 3,
            "endpoints": { "A": { "requests": 3, "errors": 0, "inputTokens": 1, "outputTokens": 2 } }
        }))
        .unwrap();
        let snap = telemetry_from_wire(resp);
        assert_eq!(snap.total_requests, 3);
        assert_eq!(snap.stats_for("A").total_tokens(), 3);
    }
}
