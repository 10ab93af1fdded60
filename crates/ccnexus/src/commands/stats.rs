//! Usage statistics handler.

use serde::Serialize;
use tabled::Tabled;

use ccnexus_core::{DisplayModel, EndpointRow, EndpointStats};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsView<'a> {
    total_requests: u64,
    endpoint_count: usize,
    enabled_count: usize,
    endpoints: Vec<EndpointUsage<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EndpointUsage<'a> {
    name: &'a str,
    enabled: bool,
    #[serde(flatten)]
    stats: EndpointStats,
    total_tokens: u64,
}

impl<'a> StatsView<'a> {
    fn new(model: &'a DisplayModel) -> Self {
        Self {
            total_requests: model.total_requests,
            endpoint_count: model.endpoint_count,
            enabled_count: model.enabled_count,
            endpoints: model
                .rows()
                .iter()
                .map(|r| EndpointUsage {
                    name: &r.name,
                    enabled: r.enabled,
                    stats: r.stats,
                    total_tokens: r.total_tokens,
                })
                .collect(),
        }
    }
}

#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Requests")]
    requests: u64,
    #[tabled(rename = "Errors")]
    errors: u64,
    #[tabled(rename = "In")]
    input: String,
    #[tabled(rename = "Out")]
    output: String,
    #[tabled(rename = "Total")]
    total: String,
}

impl From<&EndpointRow> for UsageRow {
    fn from(r: &EndpointRow) -> Self {
        Self {
            name: r.name.clone(),
            requests: r.stats.requests,
            errors: r.stats.errors,
            input: r.input_tokens_display.clone(),
            output: r.output_tokens_display.clone(),
            total: r.total_tokens_display.clone(),
        }
    }
}

fn header(model: &DisplayModel) -> String {
    let port = model
        .port
        .map_or_else(|| "unknown".to_owned(), |p| p.to_string());
    format!(
        "Total requests: {} · Endpoints: {} ({} enabled) · Port: {port}",
        model.total_requests, model.endpoint_count, model.enabled_count
    )
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let console = util::connect(global).await?;
    let model = console.display();
    console.disconnect().await;

    let view = StatsView::new(&model);
    let out = output::render_single(
        global.output,
        &view,
        |_| {
            let rows: Vec<UsageRow> = model.rows().iter().map(UsageRow::from).collect();
            if rows.is_empty() {
                header(&model)
            } else {
                format!("{}\n{}", header(&model), output::render_table(&rows))
            }
        },
        |v| {
            v.endpoints
                .iter()
                .map(|e| format!("{}\t{}", e.name, e.stats.requests))
                .collect::<Vec<_>>()
                .join("\n")
        },
    )?;
    output::print_output(&out, global.quiet);

    if global.output == OutputFormat::Table {
        if let Some(ref err) = model.last_error {
            output::notice(&format!("warning: {err}"), global.quiet);
        }
    }
    Ok(())
}
