//! Reactive data layer between `ccnexus-api` and UI consumers (CLI / TUI).
//!
//! This crate owns the console's synchronization logic: it keeps a locally
//! displayed endpoint list and its usage counters consistent with backend
//! state that changes independently of the console.
//!
//! - **[`Console`]**: Central facade managing the full lifecycle:
//!   [`connect()`](Console::connect) builds the host client, fetches the
//!   initial snapshots, then spawns the telemetry poll, the directory
//!   refresh and the command processor. [`Console::oneshot()`] runs a single
//!   CLI invocation without background tasks.
//!
//! - **[`SnapshotStore`]**: Two versioned value slots (directory and
//!   telemetry) plus the optimistic toggle overlays, all behind one mutex.
//!   Every replacement rebuilds the [`DisplayModel`] and publishes it with
//!   `watch::Sender::send_replace` before the lock is released, so
//!   subscribers never see a model built from a half-applied update.
//!
//! - **[`reconcile`]**: Pure merge of a [`DirectorySnapshot`] and a
//!   [`TelemetrySnapshot`] into display rows, joined by endpoint name.
//!
//! - **[`Command`]**: Typed mutation requests routed through an `mpsc`
//!   channel to the console's command processor. Every command is validated
//!   before it is queued and position-checked before it reaches the host.
//!
//! - **[`OptimisticToggle`]**: The enable/disable switch's
//!   Idle → Pending → Committed / RolledBack state machine.

pub mod command;
pub mod config;
pub mod console;
pub mod convert;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;
pub mod stream;
pub mod toggle;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::requests::{EndpointForm, EndpointSelector, validate_port};
pub use command::{Command, CommandResult};
pub use config::{ConsoleConfig, TlsVerification};
pub use console::{ConnectionState, Console, EditDraft};
pub use error::CoreError;
pub use reconcile::{
    DisplayBody, DisplayModel, EndpointRow, format_tokens, mask_api_key, reconcile,
};
pub use store::SnapshotStore;
pub use stream::DisplayStream;
pub use toggle::{OptimisticToggle, TogglePhase};

// Re-export model types at the crate root for ergonomics.
pub use model::{DirectorySnapshot, Endpoint, EndpointStats, Position, TelemetrySnapshot};
