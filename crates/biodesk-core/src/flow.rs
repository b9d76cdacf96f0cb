// ── Page flows ──
//
// Screen-agnostic models of the list, detail, and dashboard pages. Each
// owns its bindings and table state; a UI layer calls `sync()` when a
// change signal arrives, reads the status or table, and routes user
// actions back through these methods.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::backend::Backend;
use crate::binding::{Binding, Remote};
use crate::entity::{Entity, EntityKind, Relation, key_string};
use crate::error::CoreError;
use crate::form::{FormModel, Payload};
use crate::route::Route;
use crate::status::StatusView;
use crate::table::{ColumnKind, DataTable, TableView, format_cell};
use crate::with_entity;

/// Records among `records` whose `foreign_key` field equals `parent_key`.
pub fn related<'a, C: Entity>(
    records: &'a [C],
    foreign_key: &'a str,
    parent_key: &'a str,
) -> impl Iterator<Item = &'a C> + 'a {
    records.iter().filter(move |record| {
        record
            .field(foreign_key)
            .as_ref()
            .and_then(key_string)
            .is_some_and(|value| value == parent_key)
    })
}

/// Label/value pairs for a record, labelled from its column and form
/// specifications.
pub fn describe<E: Entity>(record: &E) -> Vec<(String, String)> {
    record
        .fields()
        .iter()
        .map(|(key, value)| {
            let column = E::columns().iter().find(|c| c.key == key.as_str());
            let label = column
                .map(|c| c.label)
                .or_else(|| {
                    E::form_fields()
                        .iter()
                        .find(|f| f.key == key.as_str())
                        .map(|f| f.label)
                })
                .map_or_else(|| humanize(key), str::to_owned);
            let kind = match (column, value) {
                (Some(c), _) => c.kind,
                (None, Value::Bool(_)) => ColumnKind::Boolean,
                _ => ColumnKind::Text,
            };
            (label, format_cell(Some(value), kind))
        })
        .collect()
}

fn humanize(key: &str) -> String {
    let spaced = key.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

// ── List page ────────────────────────────────────────────────────────

/// A collection screen: one fixed binding feeding one table.
pub struct ListPage<E: Entity> {
    backend: Backend,
    binding: Binding<Vec<E>>,
    table: DataTable<E>,
    seen: Option<Arc<Vec<E>>>,
}

impl<E: Entity> ListPage<E> {
    pub fn new(backend: &Backend) -> Self {
        Self {
            backend: backend.clone(),
            binding: backend.collection::<E>(),
            table: DataTable::new().with_page_size(backend.page_size()),
            seen: None,
        }
    }

    pub fn binding(&self) -> &Binding<Vec<E>> {
        &self.binding
    }

    pub fn watch_changes(&self, signal: &mpsc::UnboundedSender<()>) {
        self.binding.forward_changes(signal);
    }

    /// Feed the latest loaded list into the table. Returns `true` when
    /// the rows were replaced.
    pub fn sync(&mut self) -> bool {
        let Some(data) = self.binding.current().value().cloned() else {
            return false;
        };
        if self.seen.as_ref().is_some_and(|seen| Arc::ptr_eq(seen, &data)) {
            return false;
        }
        self.table.set_data(data.iter().cloned());
        self.seen = Some(data);
        true
    }

    pub fn status(&self) -> Option<StatusView> {
        StatusView::for_remote(&self.binding.current(), Vec::is_empty)
    }

    pub fn table(&self) -> &DataTable<E> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut DataTable<E> {
        &mut self.table
    }

    /// Activate the cursor row and return its detail route.
    pub fn activate_selected(&mut self) -> Option<Route> {
        self.table
            .activate_record()
            .map(|record| Route::detail(E::KIND, record.key()))
    }

    pub fn new_form(&self) -> FormModel {
        FormModel::create::<E>()
    }

    /// POST the payload, then reload the collection.
    pub async fn create(&self, payload: &Payload) -> Result<E, CoreError> {
        self.writer().create(payload).await
    }

    /// Detached handle for submitting from a spawned task.
    pub fn writer(&self) -> ListWriter<E> {
        ListWriter {
            backend: self.backend.clone(),
            binding: self.binding.clone(),
        }
    }

    pub fn retry(&self) {
        self.binding.reload();
    }
}

/// The write side of a [`ListPage`]. Holds no table state, so it can be
/// moved into the task awaiting a modal form.
#[derive(Clone)]
pub struct ListWriter<E: Entity> {
    backend: Backend,
    binding: Binding<Vec<E>>,
}

impl<E: Entity> ListWriter<E> {
    pub async fn create(&self, payload: &Payload) -> Result<E, CoreError> {
        let created = self.backend.create::<E>(payload).await?;
        self.binding.reload();
        Ok(created)
    }
}

// ── Related collections ──────────────────────────────────────────────

/// A child collection shown on a parent's detail page, independent of the
/// child's concrete type.
pub trait RelatedPanel: Send {
    fn relation(&self) -> Relation;

    fn label(&self) -> &'static str {
        self.relation().child.label()
    }

    /// Re-filter against the parent key. Returns `true` when rows changed.
    fn sync(&mut self, parent_key: Option<&str>) -> bool;

    fn status(&self) -> Option<StatusView>;

    fn table(&self) -> &dyn TableView;

    fn table_mut(&mut self) -> &mut dyn TableView;

    /// Detail route of the activated row.
    fn activate(&mut self) -> Option<Route>;

    fn retry(&self);

    fn watch_changes(&self, signal: &mpsc::UnboundedSender<()>);
}

/// Whole child collection, filtered client-side by foreign key.
pub struct RelatedCollection<C: Entity> {
    relation: Relation,
    binding: Binding<Vec<C>>,
    table: DataTable<C>,
    seen: Option<(Arc<Vec<C>>, Option<String>)>,
}

impl<C: Entity> RelatedCollection<C> {
    pub fn new(backend: &Backend, relation: Relation) -> Self {
        Self {
            relation,
            binding: backend.collection::<C>(),
            table: DataTable::new().with_page_size(backend.page_size()),
            seen: None,
        }
    }
}

impl<C: Entity> RelatedPanel for RelatedCollection<C> {
    fn relation(&self) -> Relation {
        self.relation
    }

    fn sync(&mut self, parent_key: Option<&str>) -> bool {
        let Some(data) = self.binding.current().value().cloned() else {
            return false;
        };
        if let Some((seen, key)) = &self.seen {
            if Arc::ptr_eq(seen, &data) && key.as_deref() == parent_key {
                return false;
            }
        }
        let rows: Vec<C> = match parent_key {
            Some(parent) => related(&data, self.relation.foreign_key, parent)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        self.table.set_data(rows);
        self.seen = Some((data, parent_key.map(str::to_owned)));
        true
    }

    fn status(&self) -> Option<StatusView> {
        match self.binding.current() {
            Remote::Ready(_) if self.table.total_len() == 0 => Some(StatusView::empty_with(
                "inbox",
                format!("No {}", self.relation.child.label().to_lowercase()),
                format!(
                    "No {} linked to this record yet.",
                    self.relation.child.label().to_lowercase()
                ),
            )),
            state => StatusView::for_remote(&state, |_| false),
        }
    }

    fn table(&self) -> &dyn TableView {
        &self.table
    }

    fn table_mut(&mut self) -> &mut dyn TableView {
        &mut self.table
    }

    fn activate(&mut self) -> Option<Route> {
        self.table
            .activate_record()
            .map(|record| Route::detail(C::KIND, record.key()))
    }

    fn retry(&self) {
        self.binding.reload();
    }

    fn watch_changes(&self, signal: &mpsc::UnboundedSender<()>) {
        self.binding.forward_changes(signal);
    }
}

fn related_panel(backend: &Backend, relation: Relation) -> Box<dyn RelatedPanel> {
    with_entity!(relation.child, C => {
        Box::new(RelatedCollection::<C>::new(backend, relation)) as Box<dyn RelatedPanel>
    })
}

// ── Subtype sections ─────────────────────────────────────────────────

/// What a 0..1 subtype section currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionState {
    Loading,
    /// The backend has no such record.
    Absent,
    Failed(String),
    Present(Vec<(String, String)>),
}

/// A 0..1 record sharing the parent's key, e.g. a trial's PDX data.
pub trait SectionPanel: Send {
    fn kind(&self) -> EntityKind;

    fn state(&self) -> SectionState;

    fn retry(&self);

    fn watch_changes(&self, signal: &mpsc::UnboundedSender<()>);
}

pub struct SectionRecord<S: Entity> {
    binding: Binding<Option<S>>,
}

impl<S: Entity> SectionRecord<S> {
    pub fn new(backend: &Backend, key: watch::Receiver<Option<String>>) -> Self {
        Self {
            binding: backend.optional_record::<S>(key),
        }
    }
}

impl<S: Entity> SectionPanel for SectionRecord<S> {
    fn kind(&self) -> EntityKind {
        S::KIND
    }

    fn state(&self) -> SectionState {
        match self.binding.current() {
            Remote::Loading => SectionState::Loading,
            Remote::Failed(err) => SectionState::Failed(err.to_string()),
            Remote::Ready(record) => match record.as_ref() {
                Some(record) => SectionState::Present(
                    describe(record)
                        .into_iter()
                        .filter(|(label, _)| label != "ID")
                        .collect(),
                ),
                None => SectionState::Absent,
            },
            Remote::Idle => SectionState::Absent,
        }
    }

    fn retry(&self) {
        self.binding.reload();
    }

    fn watch_changes(&self, signal: &mpsc::UnboundedSender<()>) {
        self.binding.forward_changes(signal);
    }
}

fn section_panel(
    backend: &Backend,
    kind: EntityKind,
    key: watch::Receiver<Option<String>>,
) -> Box<dyn SectionPanel> {
    with_entity!(kind, S => Box::new(SectionRecord::<S>::new(backend, key)) as Box<dyn SectionPanel>)
}

// ── Detail page ──────────────────────────────────────────────────────

/// A single-record screen with its related collections and sections.
pub struct DetailPage<E: Entity> {
    backend: Backend,
    key: watch::Sender<Option<String>>,
    record: Binding<E>,
    related: Vec<Box<dyn RelatedPanel>>,
    sections: Vec<Box<dyn SectionPanel>>,
}

impl<E: Entity> DetailPage<E> {
    pub fn new(backend: &Backend, key: impl Into<String>) -> Self {
        let (key_tx, key_rx) = watch::channel(Some(key.into()));
        let record = backend.record::<E>(key_rx.clone());
        let related = E::KIND
            .relations()
            .iter()
            .map(|relation| related_panel(backend, *relation))
            .collect();
        let sections = E::KIND
            .sections()
            .iter()
            .map(|kind| section_panel(backend, *kind, key_rx.clone()))
            .collect();

        Self {
            backend: backend.clone(),
            key: key_tx,
            record,
            related,
            sections,
        }
    }

    /// Point the page at another record. Bindings derived from the key
    /// re-fetch; related collections only re-filter.
    pub fn set_key(&self, key: impl Into<String>) {
        self.key.send_replace(Some(key.into()));
    }

    pub fn key(&self) -> Option<String> {
        self.key.borrow().clone()
    }

    pub fn binding(&self) -> &Binding<E> {
        &self.record
    }

    pub fn record(&self) -> Option<Arc<E>> {
        self.record.value()
    }

    pub fn watch_changes(&self, signal: &mpsc::UnboundedSender<()>) {
        self.record.forward_changes(signal);
        for panel in &self.related {
            panel.watch_changes(signal);
        }
        for section in &self.sections {
            section.watch_changes(signal);
        }
    }

    /// Re-filter related collections against the current key.
    pub fn sync(&mut self) -> bool {
        let key = self.key();
        let mut changed = false;
        for panel in &mut self.related {
            changed |= panel.sync(key.as_deref());
        }
        changed
    }

    pub fn status(&self) -> Option<StatusView> {
        StatusView::for_remote(&self.record.current(), |_| false)
    }

    pub fn title(&self) -> String {
        self.record().map_or_else(
            || format!("{} {}", E::KIND.singular(), self.key().unwrap_or_default()),
            |record| record.title(),
        )
    }

    /// Label/value pairs of the loaded record.
    pub fn fields(&self) -> Vec<(String, String)> {
        self.record()
            .map(|record| describe(record.as_ref()))
            .unwrap_or_default()
    }

    pub fn related(&self) -> &[Box<dyn RelatedPanel>] {
        &self.related
    }

    pub fn related_mut(&mut self) -> &mut [Box<dyn RelatedPanel>] {
        &mut self.related
    }

    pub fn sections(&self) -> &[Box<dyn SectionPanel>] {
        &self.sections
    }

    pub fn parent_route(&self) -> Option<Route> {
        self.record().and_then(|record| record.parent())
    }

    pub fn edit_form(&self) -> Option<FormModel> {
        self.record().map(|record| FormModel::edit(record.as_ref()))
    }

    /// PATCH the record, then reload it.
    pub async fn update(&self, payload: &Payload) -> Result<E, CoreError> {
        self.writer().update(payload).await
    }

    /// DELETE the record and return the list route to navigate to.
    pub async fn delete(&self) -> Result<Route, CoreError> {
        self.writer().delete().await
    }

    /// Detached handle for submitting from a spawned task. It follows
    /// later [`set_key`](Self::set_key) calls.
    pub fn writer(&self) -> DetailWriter<E> {
        DetailWriter {
            backend: self.backend.clone(),
            key: self.key.subscribe(),
            record: self.record.clone(),
        }
    }

    /// Reload the record plus any related collection or section that
    /// failed.
    pub fn retry(&self) {
        self.record.reload();
        for panel in &self.related {
            if matches!(panel.status(), Some(StatusView::Error { .. })) {
                panel.retry();
            }
        }
        for section in &self.sections {
            if matches!(section.state(), SectionState::Failed(_)) {
                section.retry();
            }
        }
    }
}

/// The write side of a [`DetailPage`].
#[derive(Clone)]
pub struct DetailWriter<E: Entity> {
    backend: Backend,
    key: watch::Receiver<Option<String>>,
    record: Binding<E>,
}

impl<E: Entity> DetailWriter<E> {
    pub async fn update(&self, payload: &Payload) -> Result<E, CoreError> {
        let key = self.require_key()?;
        let updated = self.backend.update::<E>(&key, payload).await?;
        self.record.reload();
        Ok(updated)
    }

    pub async fn delete(&self) -> Result<Route, CoreError> {
        let key = self.require_key()?;
        self.backend.delete::<E>(&key).await?;
        Ok(Route::List(E::KIND))
    }

    fn require_key(&self) -> Result<String, CoreError> {
        self.key
            .borrow()
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| CoreError::InvalidArgument {
                message: "ID is required".into(),
            })
    }
}

// ── Dashboard ────────────────────────────────────────────────────────

/// One collection summary card.
pub struct DashboardCard {
    pub kind: EntityKind,
    count: Binding<usize>,
}

impl DashboardCard {
    pub fn title(&self) -> &'static str {
        self.kind.label()
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    pub fn description(&self) -> &'static str {
        self.kind.description()
    }

    pub fn count(&self) -> Remote<usize> {
        self.count.current()
    }

    pub fn route(&self) -> Route {
        Route::List(self.kind)
    }
}

/// Landing page: a count card per top-level collection.
pub struct Dashboard {
    cards: Vec<DashboardCard>,
}

impl Dashboard {
    pub fn new(backend: &Backend) -> Self {
        let cards = EntityKind::DASHBOARD
            .iter()
            .map(|kind| DashboardCard {
                kind: *kind,
                count: backend.count_binding(*kind),
            })
            .collect();
        Self { cards }
    }

    pub fn cards(&self) -> &[DashboardCard] {
        &self.cards
    }

    pub fn watch_changes(&self, signal: &mpsc::UnboundedSender<()>) {
        for card in &self.cards {
            card.count.forward_changes(signal);
        }
    }

    /// Reload every card that failed.
    pub fn retry(&self) {
        for card in &self.cards {
            if card.count().error().is_some() {
                card.count.reload();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Patient, Tumor};

    fn tumor(code: &str, patient: &str) -> Tumor {
        Tumor {
            biobank_code: code.into(),
            patient_nhc: patient.into(),
            ..Tumor::default()
        }
    }

    #[test]
    fn related_filters_by_foreign_key() {
        let tumors = vec![tumor("BB-01", "N1"), tumor("BB-02", "N2"), tumor("BB-03", "N1")];
        let codes: Vec<String> = related(&tumors, "patient_nhc", "N1")
            .map(Entity::key)
            .collect();
        assert_eq!(codes, vec!["BB-01", "BB-03"]);
        assert_eq!(related(&tumors, "patient_nhc", "N9").count(), 0);
    }

    #[test]
    fn describe_labels_from_columns() {
        let patient = Patient {
            nhc: "N1".into(),
            sex: None,
            birth_date: chrono::NaiveDate::from_ymd_opt(1970, 5, 1),
        };
        assert_eq!(
            describe(&patient),
            vec![
                ("NHC".to_owned(), "N1".to_owned()),
                ("Sex".to_owned(), "—".to_owned()),
                ("Birth Date".to_owned(), "1970-05-01".to_owned()),
            ]
        );
    }

    #[test]
    fn unknown_fields_are_humanized() {
        assert_eq!(humanize("biobank_arrival_date"), "Biobank arrival date");
    }
}
