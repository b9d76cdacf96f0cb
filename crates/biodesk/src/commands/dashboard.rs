//! Dashboard and health command handlers.

use biodesk_core::{Backend, EntityKind, Health};
use serde_json::{Map, Value};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::CliError;
use crate::output::{self, OutputOpts};

use super::util;

/// Print one count per dashboard collection.
///
/// Counts are fetched concurrently and fail independently; the command
/// only fails when every count does.
pub async fn dashboard(backend: &Backend, opts: &OutputOpts) -> Result<(), CliError> {
    let counts = util::with_spinner(
        opts,
        "Counting records".into(),
        futures::future::join_all(
            EntityKind::DASHBOARD
                .iter()
                .map(|kind| async move { (*kind, backend.count(*kind).await) }),
        ),
    )
    .await;

    if counts.iter().all(|(_, count)| count.is_err()) {
        let first = counts.into_iter().find_map(|(_, count)| count.err());
        return Err(first.map_or_else(
            || CliError::Internal("no collections to count".into()),
            CliError::from,
        ));
    }

    let out = output::render_single(
        opts.format,
        &counts_document(&counts),
        |_| counts_table(&counts),
        |_| counts_plain(&counts),
    )?;
    output::print_output(&out, opts.quiet);
    Ok(())
}

type Count = (EntityKind, Result<usize, biodesk_core::CoreError>);

/// `{"patients": 2, "tumors": null, ...}`; failed counts are null.
fn counts_document(counts: &[Count]) -> Map<String, Value> {
    counts
        .iter()
        .map(|(kind, count)| {
            let value = count.as_ref().map_or(Value::Null, |n| Value::from(*n));
            (kind.endpoint().to_owned(), value)
        })
        .collect()
}

fn counts_table(counts: &[Count]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Collection", "Records", "Description"].map(String::from));
    for (kind, count) in counts {
        let shown = match count {
            Ok(n) => n.to_string(),
            Err(err) => format!("error: {err}"),
        };
        builder.push_record([
            kind.label().to_owned(),
            shown,
            kind.description().to_owned(),
        ]);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// `endpoint<TAB>count` lines for scripts.
fn counts_plain(counts: &[Count]) -> String {
    counts
        .iter()
        .map(|(kind, count)| match count {
            Ok(n) => format!("{}\t{n}", kind.endpoint()),
            Err(_) => format!("{}\t-", kind.endpoint()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Probe `GET /health` and print the reported status.
pub async fn health(backend: &Backend, opts: &OutputOpts) -> Result<(), CliError> {
    let url = backend.config().url.to_string();
    let report: Health =
        util::with_spinner(opts, format!("Probing {url}"), backend.health()).await?;
    let out = output::render_single(
        opts.format,
        &report,
        |h| format!("Backend at {url}: {}", h.status),
        |h| h.status.clone(),
    )?;
    output::print_output(&out, opts.quiet);
    Ok(())
}
