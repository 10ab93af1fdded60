// ── Domain model ──
//
// Canonical console types. Wire types from `ccnexus-api` are converted
// into these in `convert.rs`; nothing else reads the wire shapes.

pub mod endpoint;
pub mod snapshot;
pub mod stats;

pub use endpoint::Endpoint;
pub use snapshot::{DirectorySnapshot, Position, TelemetrySnapshot};
pub use stats::EndpointStats;
