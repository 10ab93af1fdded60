// ── Command API ──
//
// All write operations flow through a unified `Command` enum. The console
// validates each command before queueing it, then the command processor
// checks positions against the current directory and calls the host.

pub mod requests;

use serde::Serialize;

use crate::error::CoreError;
use crate::model::Position;

pub use requests::{EndpointForm, EndpointSelector, validate_port};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All possible write operations against the host.
#[derive(Debug, Clone)]
pub enum Command {
    AddEndpoint(EndpointForm),
    UpdateEndpoint {
        position: Position,
        form: EndpointForm,
    },
    RemoveEndpoint {
        position: Position,
    },
    /// Applied optimistically; rolled back if the host refuses.
    ToggleEndpoint {
        position: Position,
        enabled: bool,
    },
    UpdatePort {
        port: u32,
    },
}

impl Command {
    /// Client-side pre-flight. Forms come back trimmed.
    pub fn validate(self) -> Result<Self, CoreError> {
        Ok(match self {
            Self::AddEndpoint(form) => Self::AddEndpoint(form.validate()?),
            Self::UpdateEndpoint { position, form } => Self::UpdateEndpoint {
                position,
                form: form.validate()?,
            },
            Self::UpdatePort { port } => {
                validate_port(port)?;
                Self::UpdatePort { port }
            }
            cmd @ (Self::RemoveEndpoint { .. } | Self::ToggleEndpoint { .. }) => cmd,
        })
    }

    /// Whether a success changes the length of the endpoint list.
    pub(crate) fn reshapes_directory(&self) -> bool {
        matches!(self, Self::AddEndpoint(_) | Self::RemoveEndpoint { .. })
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum CommandResult {
    Ok,
    Toggled {
        index: usize,
        enabled: bool,
        /// `false` when the endpoint already had that value.
        changed: bool,
    },
    /// The host stores the new port but keeps listening on the old one
    /// until it is restarted.
    PortUpdated { port: u16, restart_required: bool },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_blank_add() {
        let cmd = Command::AddEndpoint(EndpointForm::new("", "url", "key"));
        assert!(matches!(cmd.validate(), Err(CoreError::Validation { .. })));
    }

    #[test]
    fn validate_rejects_port_zero() {
        assert!(Command::UpdatePort { port: 0 }.validate().is_err());
        assert!(Command::UpdatePort { port: 70_000 }.validate().is_err());
    }

    #[test]
    fn only_add_and_remove_reshape() {
        let pos = Position::new(0, 1);
        assert!(Command::RemoveEndpoint { position: pos }.reshapes_directory());
        assert!(
            !Command::ToggleEndpoint {
                position: pos,
                enabled: false
            }
            .reshapes_directory()
        );
    }
}
