// ── Optimistic enable/disable ──
//
// The one mutation the console shows before the host confirms it. The
// visible value is the target while the toggle is pending or committed,
// and the previous value once it is rolled back.

use serde::Serialize;
use strum::Display;

use crate::model::Position;

/// Where a toggle interaction stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "kebab-case")]
pub enum TogglePhase {
    /// No toggle in flight; the directory value is shown.
    #[default]
    Idle,
    /// Flipped locally, waiting for the host.
    Pending,
    /// Host acknowledged; waiting for the refreshed directory.
    Committed,
    /// Host refused; the previous value is shown again.
    RolledBack,
}

/// One toggle interaction on one endpoint.
///
/// `origin` is the position the toggle was started from and identifies the
/// interaction for its whole life. `position` follows the endpoint when a
/// refreshed directory moves it to another row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimisticToggle {
    origin: Position,
    position: Position,
    previous: bool,
    target: bool,
    phase: TogglePhase,
}

impl OptimisticToggle {
    /// Idle → Pending: the visible value becomes `!previous` immediately.
    pub fn begin(position: Position, previous: bool) -> Self {
        Self {
            origin: position,
            position,
            previous,
            target: !previous,
            phase: TogglePhase::Pending,
        }
    }

    /// Pending → Committed. Returns `false` (and changes nothing) from any
    /// other phase.
    pub fn commit(&mut self) -> bool {
        self.advance(TogglePhase::Committed)
    }

    /// Pending → RolledBack. Returns `false` (and changes nothing) from any
    /// other phase.
    pub fn roll_back(&mut self) -> bool {
        self.advance(TogglePhase::RolledBack)
    }

    fn advance(&mut self, next: TogglePhase) -> bool {
        if self.phase != TogglePhase::Pending {
            return false;
        }
        self.phase = next;
        true
    }

    /// The value the console should display right now.
    pub fn visible(&self) -> bool {
        match self.phase {
            TogglePhase::Pending | TogglePhase::Committed => self.target,
            TogglePhase::Idle | TogglePhase::RolledBack => self.previous,
        }
    }

    /// Point the toggle at the row its endpoint occupies in a newer
    /// directory. The origin is kept.
    pub fn relocate(&mut self, position: Position) {
        self.position = position;
    }

    pub fn origin(&self) -> Position {
        self.origin
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn target(&self) -> bool {
        self.target
    }

    pub fn phase(&self) -> TogglePhase {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Position {
        Position::new(0, 1)
    }

    #[test]
    fn pending_shows_target() {
        let toggle = OptimisticToggle::begin(pos(), true);
        assert_eq!(toggle.phase(), TogglePhase::Pending);
        assert!(!toggle.visible());
        assert!(!toggle.target());
    }

    #[test]
    fn rollback_restores_previous() {
        let mut toggle = OptimisticToggle::begin(pos(), true);
        assert!(toggle.roll_back());
        assert_eq!(toggle.phase(), TogglePhase::RolledBack);
        assert!(toggle.visible());
    }

    #[test]
    fn commit_keeps_target() {
        let mut toggle = OptimisticToggle::begin(pos(), false);
        assert!(toggle.commit());
        assert!(toggle.visible());
    }

    #[test]
    fn terminal_phases_do_not_transition() {
        let mut toggle = OptimisticToggle::begin(pos(), true);
        assert!(toggle.commit());
        assert!(!toggle.roll_back());
        assert_eq!(toggle.phase(), TogglePhase::Committed);

        let mut toggle = OptimisticToggle::begin(pos(), true);
        assert!(toggle.roll_back());
        assert!(!toggle.commit());
        assert_eq!(toggle.phase(), TogglePhase::RolledBack);
    }

    #[test]
    fn relocate_keeps_origin_and_value() {
        let mut toggle = OptimisticToggle::begin(pos(), true);
        toggle.relocate(Position::new(1, 2));
        assert_eq!(toggle.origin(), pos());
        assert_eq!(toggle.position(), Position::new(1, 2));
        assert_eq!(toggle.phase(), TogglePhase::Pending);
        assert!(!toggle.visible());
    }

    #[test]
    fn phase_display_is_kebab_case() {
        assert_eq!(TogglePhase::RolledBack.to_string(), "rolled-back");
        assert_eq!(TogglePhase::Pending.to_string(), "pending");
    }
}
