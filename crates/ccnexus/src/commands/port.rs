//! Listen port handlers.

use serde::Serialize;

use ccnexus_core::{CommandResult, validate_port};

use crate::cli::{GlobalOpts, PortArgs, PortCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
struct PortView {
    port: u16,
}

pub async fn handle(args: PortArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        PortCommand::Show => {
            let console = util::connect(global).await?;
            let port = console.directory_snapshot().map(|d| d.port);
            console.disconnect().await;

            let port = port.ok_or_else(|| CliError::Internal("no directory loaded".into()))?;
            let out = output::render_single(
                global.output,
                &PortView { port },
                |v| format!("Proxy port: {}", v.port),
                |v| v.port.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PortCommand::Set { port } => {
            validate_port(port)?;

            let console = util::connect(global).await?;
            let result = console.update_port(port).await;
            console.disconnect().await;

            if let CommandResult::PortUpdated {
                port,
                restart_required,
            } = result?
            {
                output::notice(&format!("✓ Proxy port set to {port}"), global.quiet);
                if restart_required {
                    output::notice(
                        "  Restart ccNexus for the new port to take effect.",
                        global.quiet,
                    );
                }
            }
            Ok(())
        }
    }
}
