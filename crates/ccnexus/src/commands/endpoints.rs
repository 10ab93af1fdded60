//! Endpoint command handlers.

use std::fmt::Write as _;
use std::io::IsTerminal;

use secrecy::SecretString;
use tabled::Tabled;

use ccnexus_core::{CommandResult, Console, EndpointForm, EndpointRow, EndpointSelector};

use crate::cli::{EndpointsArgs, EndpointsCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EndpointTableRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Requests")]
    requests: u64,
    #[tabled(rename = "Errors")]
    errors: u64,
    #[tabled(rename = "Tokens")]
    tokens: String,
}

impl EndpointTableRow {
    fn new(row: &EndpointRow, color: bool) -> Self {
        Self {
            index: row.position.index(),
            status: output::status_marker(row.enabled, color),
            name: row.name.clone(),
            url: row.api_url.clone(),
            key: row.masked_key.clone(),
            requests: row.stats.requests,
            errors: row.stats.errors,
            tokens: row.total_tokens_display.clone(),
        }
    }
}

fn detail(row: &EndpointRow, color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Endpoint #{}", row.position.index());
    let _ = writeln!(out, "  Name:    {}", row.name);
    let _ = writeln!(out, "  URL:     {}", row.api_url);
    let _ = writeln!(out, "  Key:     {}", row.masked_key);
    let _ = writeln!(out, "  Status:  {}", output::status_marker(row.enabled, color));
    let _ = writeln!(out, "  {}", row.requests_line());
    let _ = write!(out, "  {}", row.tokens_line());
    out
}

// ── Local pre-flight ────────────────────────────────────────────────

/// Use the given key, or prompt for one on an interactive terminal.
fn api_key_or_prompt(api_key: Option<String>) -> Result<SecretString, CliError> {
    if let Some(key) = api_key {
        return Ok(SecretString::from(key));
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::Validation {
            field: "apiKey".into(),
            reason: "must not be empty (pass --api-key)".into(),
        });
    }
    let key = rpassword::prompt_password("API key: ").map_err(util::prompt_err)?;
    Ok(SecretString::from(key))
}

/// Field overrides for `update`; `None` keeps the current value.
struct Changes {
    name: Option<String>,
    api_url: Option<String>,
    api_key: Option<String>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.api_url.is_none() && self.api_key.is_none()
    }

    /// Reject blank overrides the same way a full form would be rejected.
    fn check(&self) -> Result<(), CliError> {
        let probe = EndpointForm {
            name: self.name.clone().unwrap_or_else(|| "-".into()),
            api_url: self.api_url.clone().unwrap_or_else(|| "-".into()),
            api_key: SecretString::from(self.api_key.clone().unwrap_or_else(|| "-".into())),
        };
        probe.validate()?;
        Ok(())
    }

    fn apply(self, current: EndpointForm) -> EndpointForm {
        EndpointForm {
            name: self.name.unwrap_or(current.name),
            api_url: self.api_url.unwrap_or(current.api_url),
            api_key: self
                .api_key
                .map_or(current.api_key, SecretString::from),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

/// A command with every argument checked locally.
enum Action {
    List,
    Get(EndpointSelector),
    Add(EndpointForm),
    Update {
        selector: EndpointSelector,
        changes: Changes,
    },
    Remove(EndpointSelector),
    Toggle {
        selector: EndpointSelector,
        enabled: bool,
    },
}

/// Validate everything we can before touching the network.
fn prepare(command: EndpointsCommand) -> Result<Action, CliError> {
    Ok(match command {
        EndpointsCommand::List => Action::List,
        EndpointsCommand::Get { endpoint } => Action::Get(util::selector(&endpoint)?),
        EndpointsCommand::Add {
            name,
            api_url,
            api_key,
        } => Action::Add(
            EndpointForm {
                name,
                api_url,
                api_key: api_key_or_prompt(api_key)?,
            }
            .validate()?,
        ),
        EndpointsCommand::Update {
            endpoint,
            name,
            api_url,
            api_key,
        } => {
            let selector = util::selector(&endpoint)?;
            let changes = Changes {
                name,
                api_url,
                api_key,
            };
            if changes.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change (pass --name, --api-url or --api-key)".into(),
                });
            }
            changes.check()?;
            Action::Update { selector, changes }
        }
        EndpointsCommand::Remove { endpoint } => Action::Remove(util::selector(&endpoint)?),
        EndpointsCommand::Enable { endpoint } => Action::Toggle {
            selector: util::selector(&endpoint)?,
            enabled: true,
        },
        EndpointsCommand::Disable { endpoint } => Action::Toggle {
            selector: util::selector(&endpoint)?,
            enabled: false,
        },
    })
}

pub async fn handle(args: EndpointsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let action = prepare(args.command)?;

    let console = util::connect(global).await?;
    let result = run(&console, action, global).await;
    console.disconnect().await;
    result
}

async fn run(console: &Console, action: Action, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);

    match action {
        Action::List => {
            let model = console.display();
            if model.is_empty_state() && global.output == OutputFormat::Table {
                output::notice(
                    "No endpoints configured. Add one with: ccnexus endpoints add",
                    global.quiet,
                );
                return Ok(());
            }
            let out = output::render_list(
                global.output,
                model.rows(),
                |r| EndpointTableRow::new(r, color),
                |r| r.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        Action::Get(selector) => {
            let position = console.resolve(&selector).await?;
            let model = console.display();
            let row = model.row(position.index()).ok_or(CliError::NotFound {
                index: position.index(),
                len: model.rows().len(),
            })?;
            let out = output::render_single(
                global.output,
                row,
                |r| detail(r, color),
                |r| r.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        Action::Add(form) => {
            let name = form.name.clone();
            console.add_endpoint(form).await?;
            output::notice(&format!("✓ Endpoint '{name}' added"), global.quiet);
            Ok(())
        }

        Action::Update { selector, changes } => {
            let position = console.resolve(&selector).await?;
            // Start from what the host has now, not from what we listed earlier.
            let draft = console.edit_form(position).await?;
            let form = changes.apply(draft.form);
            let name = form.name.clone();
            console.update_endpoint(draft.position, form).await?;
            output::notice(&format!("✓ Endpoint '{name}' updated"), global.quiet);
            Ok(())
        }

        Action::Remove(selector) => {
            let position = console.resolve(&selector).await?;
            let name = console
                .directory_snapshot()
                .and_then(|d| d.get(position.index()).map(|e| e.name.clone()))
                .unwrap_or_default();
            if !util::confirm(
                &format!("Remove endpoint '{name}' ({position})?"),
                "endpoints remove",
                global.yes,
            )? {
                return Ok(());
            }
            console.remove_endpoint(position).await?;
            output::notice(&format!("✓ Endpoint '{name}' removed"), global.quiet);
            Ok(())
        }

        Action::Toggle { selector, enabled } => {
            let position = console.resolve(&selector).await?;
            let verb = if enabled { "enabled" } else { "disabled" };
            match console.toggle_endpoint(position, enabled).await? {
                CommandResult::Toggled { changed: false, .. } => output::notice(
                    &format!("Endpoint {position} is already {verb}"),
                    global.quiet,
                ),
                _ => output::notice(&format!("✓ Endpoint {position} {verb}"), global.quiet),
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn changes_keep_unspecified_fields() {
        let current = EndpointForm::new("A", "https://a.example", "sk-a");
        let form = Changes {
            name: None,
            api_url: Some("https://a2.example".into()),
            api_key: None,
        }
        .apply(current);

        assert_eq!(form.name, "A");
        assert_eq!(form.api_url, "https://a2.example");
        assert_eq!(form.api_key.expose_secret(), "sk-a");
    }

    #[test]
    fn update_without_fields_is_rejected() {
        let err = prepare(EndpointsCommand::Update {
            endpoint: "0".into(),
            name: None,
            api_url: None,
            api_key: None,
        })
        .err()
        .unwrap();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn blank_override_is_rejected() {
        let err = prepare(EndpointsCommand::Update {
            endpoint: "A".into(),
            name: Some("   ".into()),
            api_url: None,
            api_key: None,
        })
        .err()
        .unwrap();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "name"));
    }

    #[test]
    fn add_trims_fields() {
        let Action::Add(form) = prepare(EndpointsCommand::Add {
            name: " C ".into(),
            api_url: "https://c.example".into(),
            api_key: Some("sk-c".into()),
        })
        .ok()
        .unwrap() else {
            panic!("expected add");
        };
        assert_eq!(form.name, "C");
    }
}
