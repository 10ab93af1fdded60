//! All possible UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;
use std::sync::Arc;

use ccnexus_core::{ConnectionState, DisplayModel, EditDraft, EndpointForm, Position};

use crate::screen::ScreenId;

/// Notification severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// What the add/edit form writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit(Position),
}

/// Pending confirmation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    RemoveEndpoint { position: Position, name: String },
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RemoveEndpoint { name, .. } => {
                write!(f, "Remove endpoint '{name}'? This cannot be undone.")
            }
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    ToggleHelp,

    // ── Data (from the data bridge) ───────────────────────────────
    DisplayUpdated(Arc<DisplayModel>),
    ConnectionChanged(ConnectionState),
    /// The last connect attempt failed; the bridge retries on a timer.
    ConnectFailed(String),
    Refresh,

    // ── Endpoint mutations ────────────────────────────────────────
    /// Fetch the endpoint's current values, then open the edit form.
    RequestEdit(Position),
    EditFormReady(EditDraft),
    SubmitEndpoint { mode: FormMode, form: EndpointForm },
    /// `Err` carries the message shown inside the still-open form.
    EndpointFormResult(Result<String, String>),
    RequestToggle { position: Position, enabled: bool },
    SubmitPort(u32),
    PortResult(Result<u16, String>),

    // ── Confirm Dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}
