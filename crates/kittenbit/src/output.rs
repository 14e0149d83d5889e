use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use kittenbit::protocol::{CommandDescriptor, CommandRegistry, SessionSummary};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    id: u32,
    name: &'a str,
    required_args: usize,
    optional_args: usize,
    kind: &'a str,
}

impl<'a> From<&'a CommandDescriptor> for CommandOutput<'a> {
    fn from(descriptor: &'a CommandDescriptor) -> Self {
        Self {
            id: descriptor.id,
            name: descriptor.name,
            required_args: descriptor.required_args,
            optional_args: descriptor.optional_args,
            kind: descriptor.kind.label(),
        }
    }
}

pub fn print_commands(registry: &CommandRegistry, format: OutputFormat) {
    let rows: Vec<CommandOutput<'_>> = registry.iter().map(CommandOutput::from).collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "ARGS", "KIND"]);
            for row in &rows {
                table.add_row(vec![
                    format!("M{}", row.id),
                    row.name.to_string(),
                    arity(row),
                    row.kind.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!(
                    "M{:<4} {:<18} args={:<5} {}",
                    row.id,
                    row.name,
                    arity(row),
                    row.kind
                );
            }
        }
    }
}

fn arity(row: &CommandOutput<'_>) -> String {
    if row.optional_args == 0 {
        row.required_args.to_string()
    } else {
        format!("{}+{}", row.required_args, row.optional_args)
    }
}

#[derive(Serialize)]
struct ResponseOutput<'a> {
    request: &'a str,
    response_size: usize,
    response: String,
}

/// Print response bytes received for `request`.
pub fn print_response(request: &str, response: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ResponseOutput {
                request,
                response_size: response.len(),
                response: String::from_utf8_lossy(response).into_owned(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["REQUEST", "SIZE", "RESPONSE"])
                .add_row(vec![
                    request.to_string(),
                    response.len().to_string(),
                    escape(response),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "request={request} size={} response={}",
                response.len(),
                escape(response)
            );
        }
        OutputFormat::Raw => print_raw(response),
    }
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    controller: &'a str,
    frames: u64,
    responses: u64,
    dropped: u64,
}

/// Print the counters of a finished controller session.
pub fn print_summary(controller: &str, summary: &SessionSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = SummaryOutput {
                controller,
                frames: summary.frames,
                responses: summary.responses,
                dropped: summary.dropped,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["CONTROLLER", "FRAMES", "RESPONSES", "DROPPED"])
                .add_row(vec![
                    controller.to_string(),
                    summary.frames.to_string(),
                    summary.responses.to_string(),
                    summary.dropped.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "controller={controller} frames={} responses={} dropped={}",
                summary.frames, summary.responses, summary.dropped
            );
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Response bytes with control characters made visible (`\r`, `\n`, `\xNN`).
fn escape(bytes: &[u8]) -> String {
    bytes
        .iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}
