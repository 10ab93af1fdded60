// ── Store state ──
//
// Plain data plus the transition rules. `SnapshotStore` owns the lock and
// publishes `rebuild()` after every transition.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::CoreError;
use crate::model::{DirectorySnapshot, Endpoint, Position, TelemetrySnapshot};
use crate::reconcile::{DisplayModel, reconcile};
use crate::toggle::{OptimisticToggle, TogglePhase};

#[derive(Debug, Default)]
pub(super) struct StoreState {
    pub(super) directory: Option<Arc<DirectorySnapshot>>,
    pub(super) telemetry: Option<Arc<TelemetrySnapshot>>,
    /// Optimistic toggles keyed by index, Pending or Committed.
    pub(super) toggles: BTreeMap<usize, OptimisticToggle>,
    /// Monotonic layout counter. Bumped whenever an applied directory moves
    /// any endpoint, or after positions were invalidated.
    layout_version: u64,
    /// Set after a length-changing mutation; cleared by the next directory.
    positions_invalidated: bool,
    /// Persistent notice while the host is unreachable.
    unavailable: Option<String>,
    last_error: Option<String>,
}

impl StoreState {
    pub(super) fn apply_directory(&mut self, mut snapshot: DirectorySnapshot) -> Arc<DirectorySnapshot> {
        let moved = self
            .directory
            .as_ref()
            .is_none_or(|prev| !prev.same_layout(&snapshot));
        if moved || self.positions_invalidated {
            self.layout_version += 1;
            debug!(version = self.layout_version, "directory layout changed");
        }
        snapshot.version = self.layout_version;
        self.positions_invalidated = false;

        let previous = self.directory.take();
        self.toggles = relocate_toggles(
            std::mem::take(&mut self.toggles),
            previous.as_deref(),
            &snapshot,
            moved,
        );

        self.unavailable = None;
        self.last_error = None;

        let snapshot = Arc::new(snapshot);
        self.directory = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub(super) fn apply_telemetry(&mut self, snapshot: TelemetrySnapshot) -> Arc<TelemetrySnapshot> {
        self.unavailable = None;
        self.last_error = None;
        let snapshot = Arc::new(snapshot);
        self.telemetry = Some(Arc::clone(&snapshot));
        snapshot
    }

    pub(super) fn record_failure(&mut self, err: &CoreError) {
        if let CoreError::BackendUnavailable { reason, .. } = err {
            self.unavailable = Some(reason.clone());
        }
        self.last_error = Some(err.to_string());
    }

    pub(super) fn invalidate_positions(&mut self) {
        self.positions_invalidated = true;
    }

    pub(super) fn check_position(&self, position: Position, strict: bool) -> Result<&Endpoint, CoreError> {
        let Some(directory) = self.directory.as_deref() else {
            return Err(CoreError::PositionOutOfRange {
                index: position.index(),
                len: 0,
            });
        };

        if strict && (self.positions_invalidated || position.version() != directory.version) {
            return Err(CoreError::StalePosition {
                index: position.index(),
            });
        }

        directory
            .get(position.index())
            .ok_or(CoreError::PositionOutOfRange {
                index: position.index(),
                len: directory.len(),
            })
    }

    pub(super) fn begin_toggle(
        &mut self,
        position: Position,
        enabled: bool,
        strict: bool,
    ) -> Result<Option<OptimisticToggle>, CoreError> {
        let baseline = self.check_position(position, strict)?.enabled;
        let index = position.index();

        let visible = match self.toggles.get(&index) {
            Some(t) if t.phase() == TogglePhase::Pending => {
                return Err(CoreError::validation(
                    "enabled",
                    format!("a toggle for endpoint #{index} is already in flight"),
                ));
            }
            Some(t) => t.visible(),
            None => baseline,
        };
        if visible == enabled {
            return Ok(None);
        }

        let toggle = OptimisticToggle::begin(position, visible);
        self.toggles.insert(index, toggle);
        Ok(Some(toggle))
    }

    /// Row currently holding the toggle that was started from `origin`.
    fn toggle_index(&self, origin: Position) -> Option<usize> {
        self.toggles
            .iter()
            .find(|(_, t)| t.origin() == origin)
            .map(|(&index, _)| index)
    }

    pub(super) fn commit_toggle(&mut self, origin: Position) {
        let Some(index) = self.toggle_index(origin) else {
            return;
        };
        if let Some(toggle) = self.toggles.get_mut(&index) {
            toggle.commit();
        }
    }

    pub(super) fn roll_back_toggle(&mut self, origin: Position) {
        let Some(index) = self.toggle_index(origin) else {
            return;
        };
        if let Some(mut toggle) = self.toggles.remove(&index) {
            toggle.roll_back();
            debug!(%origin, index, visible = toggle.visible(), "toggle rolled back");
        }
    }

    pub(super) fn rebuild(&self) -> DisplayModel {
        let mut model = match self.directory.as_deref() {
            Some(directory) => reconcile(directory, self.telemetry.as_deref()),
            None => DisplayModel {
                total_requests: self.telemetry.as_ref().map_or(0, |t| t.total_requests),
                telemetry_fetched_at: self.telemetry.as_ref().map(|t| t.fetched_at),
                ..DisplayModel::default()
            },
        };
        model.apply_toggles(&self.toggles);
        if let Some(reason) = &self.unavailable {
            model.mark_unavailable(reason);
        }
        model.last_error.clone_from(&self.last_error);
        model
    }
}

/// Carry pending toggles over to a new directory.
///
/// Committed toggles are dropped because the snapshot now reflects them.
/// When the layout moved, a pending toggle follows its endpoint (same name
/// and API URL) to its new row, and is dropped if that endpoint is gone.
fn relocate_toggles(
    toggles: BTreeMap<usize, OptimisticToggle>,
    previous: Option<&DirectorySnapshot>,
    next: &DirectorySnapshot,
    moved: bool,
) -> BTreeMap<usize, OptimisticToggle> {
    let mut kept = BTreeMap::new();
    for (index, mut toggle) in toggles {
        if toggle.phase() != TogglePhase::Pending {
            continue;
        }

        let target = if moved {
            previous
                .and_then(|prev| prev.get(index))
                .and_then(|endpoint| {
                    next.endpoints
                        .iter()
                        .enumerate()
                        .find(|(row, candidate)| {
                            !kept.contains_key(row) && candidate.same_identity(endpoint)
                        })
                        .map(|(row, _)| row)
                })
        } else {
            (index < next.len()).then_some(index)
        };

        match target {
            Some(row) => {
                toggle.relocate(Position::new(row, next.version));
                if row != index {
                    debug!(from = index, to = row, "pending toggle followed its endpoint");
                }
                kept.insert(row, toggle);
            }
            None => debug!(origin = %toggle.origin(), "pending toggle dropped, endpoint gone"),
        }
    }
    kept
}
