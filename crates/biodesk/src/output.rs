//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Tables are built
//! from an entity's column specification with `tabled`, structured
//! formats go through serde, and plain emits one key per line.

use std::io::{self, IsTerminal, Write};

use biodesk_config::Defaults;
use biodesk_core::Column;
use biodesk_core::table::format_cell;
use clap::ValueEnum;
use owo_colors::OwoColorize;
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Resolved presentation settings ───────────────────────────────────

/// Output settings after merging flags with the config `[defaults]`.
#[derive(Debug, Clone, Copy)]
pub struct OutputOpts {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    /// Show spinners on stderr while requests run.
    pub progress: bool,
}

impl OutputOpts {
    pub fn resolve(global: &GlobalOpts, defaults: &Defaults) -> Self {
        let format = global
            .output
            .or_else(|| <OutputFormat as ValueEnum>::from_str(&defaults.output, true).ok())
            .unwrap_or(OutputFormat::Table);
        let mode = global
            .color
            .or_else(|| <ColorMode as ValueEnum>::from_str(&defaults.color, true).ok())
            .unwrap_or(ColorMode::Auto);
        Self {
            format,
            color: should_color(mode),
            quiet: global.quiet,
            progress: !global.quiet && io::stderr().is_terminal(),
        }
    }
}

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render records of one kind in the chosen format.
///
/// - `table`: one column per entry of `columns`, cells via `format_cell`
/// - `json` / `json-compact` / `yaml`: the records as served
/// - `plain`: the `key_field` of each record, one per line
pub fn render_records(
    format: OutputFormat,
    columns: &[Column],
    records: &[Map<String, Value>],
    key_field: &str,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(columns, records)),
        OutputFormat::Plain => Ok(records
            .iter()
            .map(|record| plain_key(record, key_field))
            .collect::<Vec<_>>()
            .join("\n")),
        structured => render_structured(structured, records),
    }
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, plain uses `id_fn`.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => Ok(detail_fn(data)),
        OutputFormat::Plain => Ok(id_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Confirmation line on stderr, e.g. "✓ Created Patient N1".
pub fn print_success(opts: &OutputOpts, message: &str) {
    if opts.quiet {
        return;
    }
    let line = format!("✓ {message}");
    if opts.color {
        eprintln!("{}", line.green());
    } else {
        eprintln!("{line}");
    }
}

/// Informational note on stderr, e.g. an empty-state message.
pub fn print_note(opts: &OutputOpts, message: &str) {
    if opts.quiet {
        return;
    }
    if opts.color {
        eprintln!("{}", message.dimmed());
    } else {
        eprintln!("{message}");
    }
}

/// Section heading inside table output.
pub fn heading(text: &str, color: bool) -> String {
    if color {
        text.bold().underline().to_string()
    } else {
        text.to_owned()
    }
}

/// Aligned `label  value` lines for a single-record view.
pub fn detail_lines(pairs: &[(String, String)], color: bool) -> String {
    let width = pairs
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0);
    pairs
        .iter()
        .map(|(label, value)| {
            let padded = format!("{label:<width$}");
            if color {
                format!("{}  {value}", padded.bold())
            } else {
                format!("{padded}  {value}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Format-specific renderers ────────────────────────────────────────

/// Rounded table with one column per entry of `columns`.
pub fn render_table(columns: &[Column], records: &[Map<String, Value>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.label.to_owned()));
    for record in records {
        builder.push_record(
            columns
                .iter()
                .map(|c| format_cell(record.get(c.key), c.kind)),
        );
    }
    builder.build().with(Style::rounded()).to_string()
}

fn plain_key(record: &Map<String, Value>, key_field: &str) -> String {
    match record.get(key_field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    match format {
        OutputFormat::JsonCompact => Ok(serde_json::to_string(data)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
        _ => Ok(serde_json::to_string_pretty(data)?),
    }
}
