//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod endpoints;
pub mod port;
pub mod stats;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a host-bound command to the appropriate handler.
///
/// Each handler validates its arguments before connecting, so a bad
/// argument never costs a round trip.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Endpoints(args) => endpoints::handle(args, global).await,
        Command::Stats => stats::handle(global).await,
        Command::Port(args) => port::handle(args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
