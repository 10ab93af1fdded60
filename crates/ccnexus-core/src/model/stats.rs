// ── Usage counters ──

use serde::Serialize;

/// Per-endpoint usage counters as last reported by the host.
///
/// All counters are monotonic on the host side; the console never derives
/// deltas from them. An endpoint without an entry reads as all-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStats {
    pub requests: u64,
    pub errors: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl EndpointStats {
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}
