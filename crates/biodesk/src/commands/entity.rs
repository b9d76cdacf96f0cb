//! Generic record command handlers, one implementation for every kind.

use std::sync::Arc;

use biodesk_core::flow::{describe, related};
use biodesk_core::{
    Backend, Column, DataTable, Entity, EntityKind, FormModel, Relation, StatusView, TableView,
    with_entity,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::cli::{EntityArgs, EntityCommand, GlobalOpts, ListArgs, OutputFormat, WriteArgs};
use crate::error::CliError;
use crate::output::{self, OutputOpts};

use super::util;

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    backend: &Backend,
    kind: EntityKind,
    args: EntityArgs,
    global: &GlobalOpts,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    with_entity!(kind, E => run::<E>(backend, args.command, global, opts).await)
}

async fn run<E: Entity>(
    backend: &Backend,
    command: EntityCommand,
    global: &GlobalOpts,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    match command {
        EntityCommand::List(args) => list::<E>(backend, args, opts).await,
        EntityCommand::Get { key, related } => get::<E>(backend, &key, related, opts).await,
        EntityCommand::Create(write) => create::<E>(backend, &write, opts).await,
        EntityCommand::Update { key, write } => update::<E>(backend, &key, &write, opts).await,
        EntityCommand::Delete { key } => delete::<E>(backend, &key, global, opts).await,
    }
}

// ── List ────────────────────────────────────────────────────────────

async fn list<E: Entity>(
    backend: &Backend,
    args: ListArgs,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    let kind = E::KIND;
    let message = format!("Fetching {}", kind.label().to_lowercase());
    let mut records = util::with_spinner(opts, message, async {
        match args.limit {
            Some(limit) => backend.list::<E>(args.offset, limit).await,
            None => backend.list_all::<E>().await,
        }
    })
    .await?;

    for (field, value) in &args.matching {
        records = related(&records, field, value).cloned().collect();
    }

    let mut table = DataTable::<E>::new();
    table.set_data(records);
    if let Some(ref filter) = args.filter {
        table.set_filter(filter);
    }
    if let Some(ref column) = args.sort {
        sort_by(&mut table, column, args.desc)?;
    }

    let rows = table.visible_records();
    debug!(kind = ?kind, total = table.total_len(), shown = rows.len(), "list rendered");

    if rows.is_empty() && opts.format == OutputFormat::Table {
        let empty = StatusView::empty();
        output::print_note(
            opts,
            &format!("{}. {}", empty.title(), empty.message().unwrap_or_default()),
        );
        return Ok(());
    }

    let out =
        output::render_records(opts.format, E::columns(), &record_fields(&rows), kind.key_field())?;
    output::print_output(&out, opts.quiet);
    Ok(())
}

/// Apply `--sort`, rejecting columns the table cannot order by.
fn sort_by<E: Entity>(table: &mut DataTable<E>, column: &str, desc: bool) -> Result<(), CliError> {
    if !table.columns().iter().any(|c| c.key == column && c.sortable) {
        let sortable: Vec<&str> = table
            .columns()
            .iter()
            .filter(|c| c.sortable)
            .map(|c| c.key)
            .collect();
        return Err(CliError::Validation {
            field: "sort".into(),
            reason: format!("expected one of: {}", sortable.join(", ")),
        });
    }
    table.toggle_sort(column);
    if desc {
        table.toggle_sort(column);
    }
    Ok(())
}

// ── Get ─────────────────────────────────────────────────────────────

/// A child collection filtered to one parent.
struct ChildRows {
    kind: EntityKind,
    columns: &'static [Column],
    rows: Vec<Map<String, Value>>,
}

/// An optional subtype record sharing the parent's key.
struct Section {
    kind: EntityKind,
    pairs: Vec<(String, String)>,
    fields: Map<String, Value>,
}

async fn get<E: Entity>(
    backend: &Backend,
    key: &str,
    with_related: bool,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    let kind = E::KIND;
    let message = format!("Fetching {} {key}", kind.singular());
    let record = util::with_spinner(opts, message, backend.get::<E>(key))
        .await
        .map_err(|e| CliError::for_record(e, kind, key))?;

    if !with_related {
        let out = output::render_single(
            opts.format,
            &record,
            |r| output::detail_lines(&describe(r), opts.color),
            Entity::key,
        )?;
        output::print_output(&out, opts.quiet);
        return Ok(());
    }

    let record_key = record.key();
    let message = format!("Fetching records linked to {key}");
    let (children, sections) = util::with_spinner(opts, message, async {
        let children = futures::future::try_join_all(
            kind.relations()
                .iter()
                .map(|relation| fetch_children(backend, *relation, &record_key)),
        );
        let sections = futures::future::try_join_all(
            kind.sections()
                .iter()
                .map(|section| fetch_section(backend, *section, &record_key)),
        );
        futures::future::try_join(children, sections).await
    })
    .await?;
    let sections: Vec<Section> = sections.into_iter().flatten().collect();

    let out = match opts.format {
        OutputFormat::Table => render_related_table(&record, &children, &sections, opts.color),
        OutputFormat::Plain => record_key,
        structured => {
            let mut document = Map::new();
            document.insert("record".into(), Value::Object(record.fields()));
            let related: Map<String, Value> = children
                .iter()
                .map(|child| {
                    let rows = child.rows.iter().cloned().map(Value::Object).collect();
                    (child.kind.endpoint().to_owned(), Value::Array(rows))
                })
                .collect();
            document.insert("related".into(), Value::Object(related));
            let present: Map<String, Value> = kind
                .sections()
                .iter()
                .map(|section| {
                    let value = sections
                        .iter()
                        .find(|s| s.kind == *section)
                        .map_or(Value::Null, |s| Value::Object(s.fields.clone()));
                    (section.endpoint().to_owned(), value)
                })
                .collect();
            if !present.is_empty() {
                document.insert("sections".into(), Value::Object(present));
            }
            output::render_single(structured, &document, |_| String::new(), |_| String::new())?
        }
    };
    output::print_output(&out, opts.quiet);
    Ok(())
}

async fn fetch_children(
    backend: &Backend,
    relation: Relation,
    parent_key: &str,
) -> Result<ChildRows, CliError> {
    with_entity!(relation.child, C => {
        let all = backend.list_all::<C>().await?;
        Ok(ChildRows {
            kind: C::KIND,
            columns: C::columns(),
            rows: related(&all, relation.foreign_key, parent_key)
                .map(Entity::fields)
                .collect(),
        })
    })
}

async fn fetch_section(
    backend: &Backend,
    kind: EntityKind,
    key: &str,
) -> Result<Option<Section>, CliError> {
    with_entity!(kind, S => {
        let found = backend.find::<S>(key).await?;
        Ok(found.map(|record| Section {
            kind,
            pairs: describe(&record),
            fields: record.fields(),
        }))
    })
}

fn render_related_table<E: Entity>(
    record: &E,
    children: &[ChildRows],
    sections: &[Section],
    color: bool,
) -> String {
    let mut blocks = vec![output::detail_lines(&describe(record), color)];
    for section in sections {
        let pairs: Vec<(String, String)> = section
            .pairs
            .iter()
            .filter(|(label, _)| label != "ID")
            .cloned()
            .collect();
        blocks.push(format!(
            "{}\n{}",
            output::heading(section.kind.singular(), color),
            output::detail_lines(&pairs, color)
        ));
    }
    for child in children {
        let title = format!("{} ({})", child.kind.label(), child.rows.len());
        let body = if child.rows.is_empty() {
            format!("No {}", child.kind.label().to_lowercase())
        } else {
            output::render_table(child.columns, &child.rows)
        };
        blocks.push(format!("{}\n{body}", output::heading(&title, color)));
    }
    blocks.join("\n\n")
}

// ── Create / Update ─────────────────────────────────────────────────

/// Apply file values, then `--set` values, to the form.
fn fill_form(form: &mut FormModel, write: &WriteArgs) -> Result<(), CliError> {
    let mut assignments = match write.from_file {
        Some(ref path) => util::read_assignments(path)?,
        None => Vec::new(),
    };
    assignments.extend(write.set.iter().cloned());

    for (field, value) in assignments {
        if form.set_value(&field, value) {
            continue;
        }
        let known = form.fields().iter().any(|f| f.key == field);
        let reason = if known {
            "cannot be changed on an existing record".to_owned()
        } else {
            let keys: Vec<&str> = form
                .fields()
                .iter()
                .filter(|f| form.is_editable(f))
                .map(|f| f.key)
                .collect();
            format!("unknown field; expected one of: {}", keys.join(", "))
        };
        return Err(CliError::Validation { field, reason });
    }
    Ok(())
}

async fn create<E: Entity>(
    backend: &Backend,
    write: &WriteArgs,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    let mut form = FormModel::create::<E>();
    fill_form(&mut form, write)?;
    let missing = form.missing_required();
    if !missing.is_empty() {
        return Err(CliError::Validation {
            field: missing.join(", "),
            reason: "is required (pass --set FIELD=VALUE)".into(),
        });
    }
    let payload = form.payload().map_err(biodesk_core::CoreError::from)?;

    let message = format!("Creating {}", E::KIND.singular());
    let created = util::with_spinner(opts, message, backend.create::<E>(&payload)).await?;
    output::print_success(opts, &format!("Created {}", created.title()));
    render_written(&created, opts)
}

async fn update<E: Entity>(
    backend: &Backend,
    key: &str,
    write: &WriteArgs,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    if write.set.is_empty() && write.from_file.is_none() {
        return Err(CliError::Validation {
            field: "update".into(),
            reason: "nothing to change (pass --set FIELD=VALUE or --from-file)".into(),
        });
    }

    let kind = E::KIND;
    let current = backend
        .get::<E>(key)
        .await
        .map_err(|e| CliError::for_record(e, kind, key))?;
    let mut form = FormModel::edit(&current);
    fill_form(&mut form, write)?;
    let payload = form.payload().map_err(biodesk_core::CoreError::from)?;

    let message = format!("Saving {} {key}", kind.singular());
    let updated = util::with_spinner(opts, message, backend.update::<E>(key, &payload))
        .await
        .map_err(|e| CliError::for_record(e, kind, key))?;
    output::print_success(opts, &format!("Updated {}", updated.title()));
    render_written(&updated, opts)
}

fn render_written<E: Entity>(record: &E, opts: &OutputOpts) -> Result<(), CliError> {
    let out = output::render_single(
        opts.format,
        record,
        |r| output::detail_lines(&describe(r), opts.color),
        Entity::key,
    )?;
    output::print_output(&out, opts.quiet);
    Ok(())
}

// ── Delete ──────────────────────────────────────────────────────────

async fn delete<E: Entity>(
    backend: &Backend,
    key: &str,
    global: &GlobalOpts,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    let kind = E::KIND;
    let prompt = format!("Delete {} {key}? This cannot be undone.", kind.singular());
    if !util::confirm(&prompt, &format!("{} delete", kind.slug()), global.yes)? {
        output::print_note(opts, "Aborted");
        return Ok(());
    }

    let message = format!("Deleting {} {key}", kind.singular());
    util::with_spinner(opts, message, backend.delete::<E>(key))
        .await
        .map_err(|e| CliError::for_record(e, kind, key))?;
    output::print_success(opts, &format!("Deleted {} {key}", kind.singular()));
    Ok(())
}

/// Serialized fields of each record, in table order.
fn record_fields<E: Entity>(records: &[Arc<E>]) -> Vec<Map<String, Value>> {
    records.iter().map(|record| record.fields()).collect()
}
