// ── Snapshot store ──
//
// Two owned, versioned value slots (directory, telemetry) plus in-flight
// toggle overlays behind one mutex. The display model is rebuilt and
// published while that mutex is held, so readers never see a model built
// from a half-applied update.

mod state;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::CoreError;
use crate::model::{DirectorySnapshot, Endpoint, Position, TelemetrySnapshot};
use crate::reconcile::DisplayModel;
use crate::stream::DisplayStream;
use crate::toggle::OptimisticToggle;

use state::StoreState;

/// Single-writer home of the console's snapshots.
///
/// Writers are short and never await, so a blocking mutex is fine even on
/// the async runtime. Subscribers only ever touch the `watch` side.
pub struct SnapshotStore {
    state: Mutex<StoreState>,
    display: watch::Sender<Arc<DisplayModel>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (display, _) = watch::channel(Arc::new(DisplayModel::default()));
        Self {
            state: Mutex::new(StoreState::default()),
            display,
        }
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Replace the directory slot. Returns the snapshot as stored, with its
    /// layout version assigned.
    pub fn apply_directory(&self, snapshot: DirectorySnapshot) -> Arc<DirectorySnapshot> {
        self.write(|state| state.apply_directory(snapshot))
    }

    /// Replace the telemetry slot.
    pub fn apply_telemetry(&self, snapshot: TelemetrySnapshot) -> Arc<TelemetrySnapshot> {
        self.write(|state| state.apply_telemetry(snapshot))
    }

    /// Record a failed fetch. Both snapshots are kept.
    pub fn record_failure(&self, err: &CoreError) {
        self.write(|state| state.record_failure(err));
    }

    /// Invalidate every outstanding position until the next directory
    /// snapshot arrives. Called after the host accepted an add or remove.
    pub fn invalidate_positions(&self) {
        self.write(StoreState::invalidate_positions);
    }

    /// Idle → Pending for the endpoint at `position`, flipping its visible
    /// value. Returns `None` when the endpoint already shows `enabled`.
    pub fn begin_toggle(
        &self,
        position: Position,
        enabled: bool,
        strict: bool,
    ) -> Result<Option<OptimisticToggle>, CoreError> {
        self.write(|state| state.begin_toggle(position, enabled, strict))
    }

    /// Pending → Committed. The overlay stays until the next directory
    /// snapshot replaces it.
    /// The toggle is found by the position it was started from, wherever
    /// its endpoint has moved since.
    pub fn commit_toggle(&self, origin: Position) {
        self.write(|state| state.commit_toggle(origin));
    }

    /// Pending → RolledBack. The overlay is dropped, so the row shows the
    /// directory value again.
    pub fn roll_back_toggle(&self, origin: Position) {
        self.write(|state| state.roll_back_toggle(origin));
    }

    /// Drop both snapshots and all overlays.
    pub fn clear(&self) {
        self.write(|state| *state = StoreState::default());
    }

    fn write<R>(&self, f: impl FnOnce(&mut StoreState) -> R) -> R {
        let mut state = self.lock();
        let out = f(&mut state);
        self.display.send_replace(Arc::new(state.rebuild()));
        out
    }

    // A panicking writer leaves the previous, fully-built state behind;
    // every write replaces whole values.
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Validate `position` against the current directory and return the
    /// endpoint it names.
    pub fn check_position(&self, position: Position, strict: bool) -> Result<Endpoint, CoreError> {
        self.lock().check_position(position, strict).cloned()
    }

    pub fn directory(&self) -> Option<Arc<DirectorySnapshot>> {
        self.lock().directory.clone()
    }

    pub fn telemetry(&self) -> Option<Arc<TelemetrySnapshot>> {
        self.lock().telemetry.clone()
    }

    /// Current display model (cheap `Arc` clone).
    pub fn display(&self) -> Arc<DisplayModel> {
        self.display.borrow().clone()
    }

    pub fn subscribe(&self) -> DisplayStream {
        DisplayStream::new(self.display.subscribe())
    }

    /// Toggles currently overlaid on the directory.
    pub fn pending_toggles(&self) -> usize {
        self.lock().toggles.len()
    }
}
