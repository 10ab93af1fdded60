// ── Snapshots ──
//
// Immutable, wholesale-replaced views of host state. The store wraps
// each in an `Arc` and swaps the whole value on every successful fetch.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Endpoint, EndpointStats};

/// An endpoint position tagged with the directory layout version it was
/// read from.
///
/// Positions are only meaningful against that layout. The store rejects a
/// position whose version has been superseded instead of letting it act on
/// whichever endpoint now sits at the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    index: usize,
    version: u64,
}

impl Position {
    pub fn new(index: usize, version: u64) -> Self {
        Self { index, version }
    }

    /// Zero-based index into the host's endpoint list.
    pub fn index(self) -> usize {
        self.index
    }

    /// Layout version the index was computed against.
    pub fn version(self) -> u64 {
        self.version
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

/// The ordered endpoint list plus the proxy listen port.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    /// Layout version, assigned by the store when the snapshot is applied.
    pub version: u64,
    pub port: u16,
    pub endpoints: Vec<Endpoint>,
    pub fetched_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Endpoint> {
        self.endpoints.get(index)
    }

    /// A position for `index` in this snapshot, if it exists.
    pub fn position(&self, index: usize) -> Option<Position> {
        (index < self.len()).then(|| Position::new(index, self.version))
    }

    /// Positions of all endpoints named `name`.
    pub fn positions_named(&self, name: &str) -> Vec<Position> {
        self.endpoints
            .iter()
            .enumerate()
            .filter(|(_, ep)| ep.name == name)
            .map(|(i, _)| Position::new(i, self.version))
            .collect()
    }

    pub fn enabled_count(&self) -> usize {
        self.endpoints.iter().filter(|ep| ep.enabled).count()
    }

    /// Whether `other` keeps every endpoint at the same position.
    pub(crate) fn same_layout(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .endpoints
                .iter()
                .zip(&other.endpoints)
                .all(|(a, b)| a.same_identity(b))
    }
}

/// Aggregate and per-endpoint usage counters.
#[derive(Debug, Clone)]
pub struct TelemetrySnapshot {
    pub total_requests: u64,
    pub endpoints: HashMap<String, EndpointStats>,
    pub fetched_at: DateTime<Utc>,
}

impl TelemetrySnapshot {
    /// Counters for `name`, all-zero when the host has none.
    pub fn stats_for(&self, name: &str) -> EndpointStats {
        self.endpoints.get(name).copied().unwrap_or_default()
    }
}
