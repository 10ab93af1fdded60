// ── Reconciler ──
//
// Merges the latest directory and telemetry snapshots into the model the
// CLI and TUI render. Rows are keyed by position for directory identity
// and joined to telemetry by name. The model is always rebuilt in full.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{DirectorySnapshot, EndpointStats, Position, TelemetrySnapshot};
use crate::toggle::{OptimisticToggle, TogglePhase};

/// What the endpoint list area shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum DisplayBody {
    /// No directory has been fetched yet.
    Loading,
    /// The host cannot be reached. Replaces the list until a fetch succeeds.
    Unavailable { reason: String },
    /// The host has no endpoints configured.
    Empty,
    Rows { rows: Vec<EndpointRow> },
}

/// One endpoint, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRow {
    /// Handle for edit, delete and toggle on this row.
    pub position: Position,
    pub name: String,
    pub api_url: String,
    pub masked_key: String,
    /// Visible value, including any optimistic toggle.
    pub enabled: bool,
    pub toggle: TogglePhase,
    pub stats: EndpointStats,
    pub total_tokens: u64,
    pub total_tokens_display: String,
    pub input_tokens_display: String,
    pub output_tokens_display: String,
}

impl EndpointRow {
    /// `Requests: 10 | Errors: 1`
    pub fn requests_line(&self) -> String {
        format!(
            "Requests: {} | Errors: {}",
            self.stats.requests, self.stats.errors
        )
    }

    /// `Tokens: 2.0K (In: 500, Out: 1.5K)`
    pub fn tokens_line(&self) -> String {
        format!(
            "Tokens: {} (In: {}, Out: {})",
            self.total_tokens_display, self.input_tokens_display, self.output_tokens_display
        )
    }
}

/// Everything the console shows, derived from the two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayModel {
    /// Directory layout version the rows were built from (0 before the
    /// first fetch).
    pub version: u64,
    pub port: Option<u16>,
    pub total_requests: u64,
    pub endpoint_count: usize,
    pub enabled_count: usize,
    pub body: DisplayBody,
    /// Most recent fetch failure, cleared by the next successful fetch.
    pub last_error: Option<String>,
    pub directory_fetched_at: Option<DateTime<Utc>>,
    pub telemetry_fetched_at: Option<DateTime<Utc>>,
}

impl Default for DisplayModel {
    fn default() -> Self {
        Self {
            version: 0,
            port: None,
            total_requests: 0,
            endpoint_count: 0,
            enabled_count: 0,
            body: DisplayBody::Loading,
            last_error: None,
            directory_fetched_at: None,
            telemetry_fetched_at: None,
        }
    }
}

impl DisplayModel {
    /// Rows in directory order; empty for every non-list body.
    pub fn rows(&self) -> &[EndpointRow] {
        match &self.body {
            DisplayBody::Rows { rows } => rows,
            _ => &[],
        }
    }

    pub fn row(&self, index: usize) -> Option<&EndpointRow> {
        self.rows().get(index)
    }

    pub fn is_empty_state(&self) -> bool {
        matches!(self.body, DisplayBody::Empty)
    }

    /// Overlay in-flight toggles onto the rows.
    pub(crate) fn apply_toggles(&mut self, toggles: &BTreeMap<usize, OptimisticToggle>) {
        if toggles.is_empty() {
            return;
        }
        if let DisplayBody::Rows { rows } = &mut self.body {
            for row in rows.iter_mut() {
                if let Some(toggle) = toggles.get(&row.position.index()) {
                    row.enabled = toggle.visible();
                    row.toggle = toggle.phase();
                }
            }
            self.enabled_count = rows.iter().filter(|r| r.enabled).count();
        }
    }

    /// Swap the list for a persistent unavailable notice.
    pub(crate) fn mark_unavailable(&mut self, reason: &str) {
        self.body = DisplayBody::Unavailable {
            reason: reason.to_owned(),
        };
    }
}

/// Merge a directory with the latest telemetry.
///
/// Produces exactly one row per directory position, in order. Stats are
/// looked up by endpoint name and default to zero. An empty directory
/// yields [`DisplayBody::Empty`], never an empty row list.
pub fn reconcile(
    directory: &DirectorySnapshot,
    telemetry: Option<&TelemetrySnapshot>,
) -> DisplayModel {
    let body = if directory.is_empty() {
        DisplayBody::Empty
    } else {
        let rows = directory
            .endpoints
            .iter()
            .enumerate()
            .map(|(index, endpoint)| {
                let stats = telemetry
                    .map(|t| t.stats_for(&endpoint.name))
                    .unwrap_or_default();
                let total_tokens = stats.total_tokens();
                EndpointRow {
                    position: Position::new(index, directory.version),
                    name: endpoint.name.clone(),
                    api_url: endpoint.api_url.clone(),
                    masked_key: endpoint.masked_key(),
                    enabled: endpoint.enabled,
                    toggle: TogglePhase::Idle,
                    stats,
                    total_tokens,
                    total_tokens_display: format_tokens(total_tokens),
                    input_tokens_display: format_tokens(stats.input_tokens),
                    output_tokens_display: format_tokens(stats.output_tokens),
                }
            })
            .collect();
        DisplayBody::Rows { rows }
    };

    DisplayModel {
        version: directory.version,
        port: Some(directory.port),
        total_requests: telemetry.map_or(0, |t| t.total_requests),
        endpoint_count: directory.len(),
        enabled_count: directory.enabled_count(),
        body,
        last_error: None,
        directory_fetched_at: Some(directory.fetched_at),
        telemetry_fetched_at: telemetry.map(|t| t.fetched_at),
    }
}

// ── Formatting ───────────────────────────────────────────────────────

const THOUSAND: u64 = 1_000;
const MILLION: u64 = 1_000_000;

/// Format a token count with a tiered unit.
///
/// Raw integer below 1,000; one decimal with `K` up to (not including)
/// 1,000,000; one decimal with `M` from there. Rounds half up, so
/// 999,999 is `1000.0K` and never rolls over to `M`.
///
/// Rounding is done on the exact integer, so every tie goes up: 1,150 is
/// `1.2K`. Formatting `1.15` as a binary float to one decimal gives `1.1K`
/// instead, because `1.15` is stored just below the tie. Hosts or tools
/// that format that way can disagree with this function on such values.
pub fn format_tokens(tokens: u64) -> String {
    if tokens < THOUSAND {
        return tokens.to_string();
    }
    let (unit, suffix) = if tokens < MILLION {
        (THOUSAND, "K")
    } else {
        (MILLION, "M")
    };
    let tenths = tokens / (unit / 10) + u64::from(tokens % (unit / 10) >= unit / 20);
    format!("{}.{}{suffix}", tenths / 10, tenths % 10)
}

/// Mask an API key for display: `***` for keys of four characters or
/// fewer, otherwise `****` followed by the last four characters.
pub fn mask_api_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        return "***".to_owned();
    }
    let tail: String = key.chars().skip(len - 4).collect();
    format!("****{tail}")
}
