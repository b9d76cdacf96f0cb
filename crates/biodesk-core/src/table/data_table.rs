// ── DataTable ──
//
// In-memory view over a record list: filter, then stable sort, then
// slice into pages. The view is rebuilt whenever the data, filter, or
// sort changes; page settings survive data swaps.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use super::{Column, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS, compare_values, format_cell, search_text};
use crate::entity::Entity;

/// Sort direction for the active sort column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Active sort: column key plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub column: &'static str,
    pub direction: SortDirection,
}

struct Row<T> {
    record: Arc<T>,
    key: String,
    cells: Vec<Value>,
    /// Lowercased field values joined for substring matching.
    haystack: String,
}

/// Sortable, filterable, paginated table model over one entity type.
pub struct DataTable<T> {
    columns: Vec<Column>,
    rows: Vec<Row<T>>,
    /// Indices into `rows`: filtered, then sorted.
    view: Vec<usize>,
    filter: String,
    sort: Option<Sort>,
    page_index: usize,
    page_size: usize,
    /// Keyboard cursor, relative to the current page.
    cursor: usize,
    selected: Option<String>,
}

impl<T: Entity> DataTable<T> {
    /// Table over `T`'s own column specification.
    pub fn new() -> Self {
        Self::with_columns(T::columns().to_vec())
    }

    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            view: Vec::new(),
            filter: String::new(),
            sort: None,
            page_index: 0,
            page_size: DEFAULT_PAGE_SIZE,
            cursor: 0,
            selected: None,
        }
    }

    /// Builder-style initial page size.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Replace the underlying records.
    ///
    /// Sort, filter, and page size are kept. The page index and cursor are
    /// clamped to the new bounds.
    pub fn set_data<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.rows = records
            .into_iter()
            .map(|record| self.build_row(Arc::new(record)))
            .collect();
        self.rebuild();
    }

    fn build_row(&self, record: Arc<T>) -> Row<T> {
        let fields = record.fields();
        let cells = self
            .columns
            .iter()
            .map(|col| fields.get(col.key).cloned().unwrap_or(Value::Null))
            .collect();
        let haystack = fields
            .values()
            .filter_map(search_text)
            .collect::<Vec<_>>()
            .join("\u{25ec}")
            .to_lowercase();
        Row {
            key: record.key(),
            record,
            cells,
            haystack,
        }
    }

    fn rebuild(&mut self) {
        let needle = self.filter.as_str();
        let mut view: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| needle.is_empty() || row.haystack.contains(needle))
            .map(|(i, _)| i)
            .collect();

        let active = self.sort.and_then(|sort| {
            let col = self.columns.iter().position(|c| c.key == sort.column)?;
            Some((sort, col))
        });
        if let Some((sort, col)) = active {
            let rows = &self.rows;
            view.sort_by(|&a, &b| {
                let ord = compare_values(&rows[a].cells[col], &rows[b].cells[col]);
                match sort.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }

        self.view = view;
        self.clamp();
    }

    fn clamp(&mut self) {
        let last_page = self.page_count().saturating_sub(1);
        self.page_index = self.page_index.min(last_page);
        let on_page = self.page_range().len();
        self.cursor = self.cursor.min(on_page.saturating_sub(1));
    }

    fn page_range(&self) -> std::ops::Range<usize> {
        let start = (self.page_index * self.page_size).min(self.view.len());
        let end = (start + self.page_size).min(self.view.len());
        start..end
    }

    // ── Record access ────────────────────────────────────────────────

    /// Every record passing the filter, in sort order.
    pub fn visible_records(&self) -> Vec<Arc<T>> {
        self.view
            .iter()
            .map(|&i| Arc::clone(&self.rows[i].record))
            .collect()
    }

    /// Records on the current page, in sort order.
    pub fn page_records(&self) -> Vec<Arc<T>> {
        self.view[self.page_range()]
            .iter()
            .map(|&i| Arc::clone(&self.rows[i].record))
            .collect()
    }

    /// Record under the keyboard cursor.
    pub fn cursor_record(&self) -> Option<Arc<T>> {
        let index = self.view.get(self.page_range().start + self.cursor)?;
        self.rows.get(*index).map(|row| Arc::clone(&row.record))
    }

    /// Activate the row under the cursor: mark it selected and return it.
    pub fn activate_record(&mut self) -> Option<Arc<T>> {
        let record = self.cursor_record()?;
        self.selected = Some(record.key());
        Some(record)
    }

    /// Activate the `row`-th row of the current page (pointer click).
    pub fn activate_row(&mut self, row: usize) -> Option<Arc<T>> {
        if row >= self.page_range().len() {
            return None;
        }
        self.cursor = row;
        self.activate_record()
    }
}

impl<T: Entity> Default for DataTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Object-safe view ─────────────────────────────────────────────────

/// Type-erased table operations, so screens can drive tables of any
/// entity kind through one widget.
pub trait TableView {
    fn columns(&self) -> &[Column];

    /// Formatted cells for the current page, one `Vec` per row.
    fn page_cells(&self) -> Vec<Vec<String>>;
    /// Keys of the rows on the current page.
    fn page_keys(&self) -> Vec<String>;

    fn total_len(&self) -> usize;
    fn filtered_len(&self) -> usize;
    fn filter(&self) -> &str;
    fn sort(&self) -> Option<Sort>;
    fn page_index(&self) -> usize;
    fn page_size(&self) -> usize;
    fn page_count(&self) -> usize;
    fn cursor(&self) -> usize;
    fn selected_key(&self) -> Option<&str>;

    /// Case-insensitive substring filter; input is trimmed.
    fn set_filter(&mut self, filter: &str);
    /// Cycle a column's sort: ascending → descending → cleared.
    fn toggle_sort(&mut self, column: &str);
    /// Change page size. Resets to the first page.
    fn set_page_size(&mut self, size: usize);
    /// Step through [`PAGE_SIZE_OPTIONS`].
    fn cycle_page_size(&mut self);
    fn set_page(&mut self, index: usize);
    fn next_page(&mut self);
    fn prev_page(&mut self);
    /// Move the cursor, flowing onto adjacent pages at the edges.
    fn move_cursor(&mut self, delta: isize);
    /// Key of the row under the cursor.
    fn cursor_key(&self) -> Option<String>;
    /// Activate the cursor row, returning its key.
    fn activate(&mut self) -> Option<String>;
}

impl<T: Entity> TableView for DataTable<T> {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn page_cells(&self) -> Vec<Vec<String>> {
        self.view[self.page_range()]
            .iter()
            .map(|&i| {
                self.rows[i]
                    .cells
                    .iter()
                    .zip(&self.columns)
                    .map(|(value, col)| format_cell(Some(value), col.kind))
                    .collect()
            })
            .collect()
    }

    fn page_keys(&self) -> Vec<String> {
        self.view[self.page_range()]
            .iter()
            .map(|&i| self.rows[i].key.clone())
            .collect()
    }

    fn total_len(&self) -> usize {
        self.rows.len()
    }

    fn filtered_len(&self) -> usize {
        self.view.len()
    }

    fn filter(&self) -> &str {
        &self.filter
    }

    fn sort(&self) -> Option<Sort> {
        self.sort
    }

    fn page_index(&self) -> usize {
        self.page_index
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn page_count(&self) -> usize {
        self.view.len().div_ceil(self.page_size).max(1)
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn selected_key(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    fn set_filter(&mut self, filter: &str) {
        let normalized = filter.trim().to_lowercase();
        if normalized != self.filter {
            self.filter = normalized;
            self.rebuild();
        }
    }

    fn toggle_sort(&mut self, column: &str) {
        let Some(col) = self.columns.iter().find(|c| c.key == column && c.sortable) else {
            return;
        };
        self.sort = match self.sort {
            Some(Sort {
                column: current,
                direction: SortDirection::Ascending,
            }) if current == col.key => Some(Sort {
                column: current,
                direction: SortDirection::Descending,
            }),
            Some(Sort {
                column: current,
                direction: SortDirection::Descending,
            }) if current == col.key => None,
            _ => Some(Sort {
                column: col.key,
                direction: SortDirection::Ascending,
            }),
        };
        self.rebuild();
    }

    fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page_index = 0;
        self.cursor = 0;
        self.clamp();
    }

    fn cycle_page_size(&mut self) {
        let next = PAGE_SIZE_OPTIONS
            .iter()
            .copied()
            .find(|&s| s > self.page_size)
            .unwrap_or(PAGE_SIZE_OPTIONS[0]);
        self.set_page_size(next);
    }

    fn set_page(&mut self, index: usize) {
        self.page_index = index;
        self.clamp();
    }

    fn next_page(&mut self) {
        if self.page_index + 1 < self.page_count() {
            self.page_index += 1;
            self.cursor = 0;
        }
    }

    fn prev_page(&mut self) {
        if self.page_index > 0 {
            self.page_index -= 1;
            self.cursor = 0;
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let on_page = self.page_range().len();
        if on_page == 0 {
            return;
        }
        let target = isize::try_from(self.cursor).unwrap_or(isize::MAX) + delta;
        match target.cmp(&0) {
            Ordering::Less if self.page_index > 0 => {
                self.page_index -= 1;
                self.cursor = self.page_range().len().saturating_sub(1);
            }
            Ordering::Less => self.cursor = 0,
            _ => {
                let target = usize::try_from(target).unwrap_or(usize::MAX);
                if target < on_page {
                    self.cursor = target;
                } else if self.page_index + 1 < self.page_count() {
                    self.page_index += 1;
                    self.cursor = 0;
                } else {
                    self.cursor = on_page - 1;
                }
            }
        }
    }

    fn cursor_key(&self) -> Option<String> {
        self.cursor_record().map(|r| r.key())
    }

    fn activate(&mut self) -> Option<String> {
        self.activate_record().map(|r| r.key())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Patient, Tumor};

    fn patient(nhc: &str, sex: Option<&str>, birth: Option<(i32, u32, u32)>) -> Patient {
        Patient {
            nhc: nhc.into(),
            sex: sex.map(Into::into),
            birth_date: birth.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
        }
    }

    fn tumor(code: &str, organ: &str, patient: &str) -> Tumor {
        Tumor {
            biobank_code: code.into(),
            organ: Some(organ.into()),
            patient_nhc: patient.into(),
            ..Tumor::default()
        }
    }

    fn keys(table: &DataTable<Patient>) -> Vec<String> {
        table.visible_records().iter().map(|p| p.key()).collect()
    }

    fn sample(n: usize) -> Vec<Patient> {
        (0..n)
            .map(|i| {
                let sex = if i % 3 == 0 { Some("F") } else { Some("M") };
                patient(&format!("N{i:03}"), sex, Some((1950 + (i % 40) as i32, 1, 1)))
            })
            .collect()
    }

    #[test]
    fn defaults_to_twenty_five_rows_per_page() {
        let mut table = DataTable::<Patient>::new();
        table.set_data(sample(60));

        assert_eq!(table.page_size(), 25);
        assert_eq!(table.page_count(), 3);
        assert_eq!(table.page_records().len(), 25);
        table.set_page(2);
        assert_eq!(table.page_records().len(), 10);
    }

    #[test]
    fn filter_is_trimmed_case_insensitive_substring() {
        let mut table = DataTable::<Tumor>::new();
        table.set_data([
            tumor("BB-01", "Colon", "N1"),
            tumor("BB-02", "Lung", "N2"),
            tumor("BB-03", "colon sigmoid", "N1"),
        ]);

        table.set_filter("  COLON ");
        assert_eq!(table.filter(), "colon");
        assert_eq!(table.filtered_len(), 2);

        // Matches fields that are not displayed as columns.
        table.set_filter("n2");
        assert_eq!(table.page_keys(), vec!["BB-02".to_string()]);
    }

    #[test]
    fn filter_is_idempotent() {
        let mut table = DataTable::<Patient>::new();
        table.set_data(sample(40));

        table.set_filter("f");
        let once = keys(&table);
        table.set_filter("f");
        assert_eq!(keys(&table), once);
    }

    #[test]
    fn filter_and_sort_commute_on_row_set() {
        let data = sample(70);

        let mut filter_first = DataTable::<Patient>::new();
        filter_first.set_data(data.clone());
        filter_first.set_filter("m");
        filter_first.toggle_sort("birth_date");

        let mut sort_first = DataTable::<Patient>::new();
        sort_first.set_data(data);
        sort_first.toggle_sort("birth_date");
        sort_first.set_filter("m");

        let a: BTreeSet<String> = keys(&filter_first).into_iter().collect();
        let b: BTreeSet<String> = keys(&sort_first).into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(keys(&filter_first), keys(&sort_first));
    }

    #[test]
    fn pages_union_to_filtered_sorted_rows() {
        for size in [10, 25, 50, 100] {
            let mut table = DataTable::<Patient>::new();
            table.set_data(sample(123));
            table.set_filter("1");
            table.toggle_sort("nhc");
            table.toggle_sort("nhc"); // descending
            table.set_page_size(size);

            let mut union = Vec::new();
            for page in 0..table.page_count() {
                table.set_page(page);
                union.extend(table.page_records().iter().map(|p| p.key()));
            }
            assert_eq!(union, keys(&table), "page size {size}");
        }
    }

    #[test]
    fn sort_cycles_and_skips_unsortable_columns() {
        let mut table = DataTable::<Patient>::with_columns(vec![
            Column::text("nhc", "NHC"),
            Column::text("sex", "Sex").unsortable(),
        ]);
        table.set_data([patient("N2", None, None), patient("N1", None, None)]);

        table.toggle_sort("sex");
        assert_eq!(table.sort(), None);

        table.toggle_sort("nhc");
        assert_eq!(keys(&table), vec!["N1", "N2"]);
        table.toggle_sort("nhc");
        assert_eq!(keys(&table), vec!["N2", "N1"]);
        table.toggle_sort("nhc");
        assert_eq!(table.sort(), None);
        assert_eq!(keys(&table), vec!["N2", "N1"]);
    }

    #[test]
    fn nulls_sort_first_ascending_and_last_descending() {
        let mut table = DataTable::<Patient>::new();
        table.set_data([
            patient("N1", None, Some((1980, 5, 1))),
            patient("N2", None, None),
            patient("N3", None, Some((1970, 1, 1))),
        ]);

        table.toggle_sort("birth_date");
        assert_eq!(keys(&table), vec!["N2", "N3", "N1"]);
        table.toggle_sort("birth_date");
        assert_eq!(keys(&table), vec!["N1", "N3", "N2"]);
    }

    #[test]
    fn mixed_key_codes_sort_in_both_directions() {
        let codes = (0..55).map(|i| match i % 3 {
            0 => format!("{}", (i * 7) % 101),
            1 => format!("{}a", (i * 13) % 23),
            _ => format!("{}", i % 12),
        });
        let mut table = DataTable::<Patient>::new();
        table.set_data(codes.map(|nhc| patient(&nhc, None, None)).collect::<Vec<_>>());
        let ordered = |table: &DataTable<Patient>, wrong: Ordering| {
            keys(table).windows(2).all(|w| {
                compare_values(&Value::from(w[0].as_str()), &Value::from(w[1].as_str())) != wrong
            })
        };

        table.toggle_sort("nhc");
        assert_eq!(table.filtered_len(), 55);
        assert!(ordered(&table, Ordering::Greater));
        assert_eq!(keys(&table)[0], "0");
        assert!(keys(&table).last().unwrap().ends_with('a'));

        table.toggle_sort("nhc");
        assert!(ordered(&table, Ordering::Less));
        assert!(keys(&table).first().unwrap().ends_with('a'));
    }

    #[test]
    fn page_size_change_resets_page_index() {
        let mut table = DataTable::<Patient>::new();
        table.set_data(sample(120));
        table.set_page(3);
        assert_eq!(table.page_index(), 3);

        table.toggle_sort("nhc");
        assert_eq!(table.page_index(), 3, "sorting keeps the page");

        table.set_page_size(50);
        assert_eq!(table.page_index(), 0);
        table.cycle_page_size();
        assert_eq!(table.page_size(), 100);
        table.cycle_page_size();
        assert_eq!(table.page_size(), 10);
    }

    #[test]
    fn new_data_keeps_settings_and_clamps_page() {
        let mut table = DataTable::<Patient>::new().with_page_size(10);
        table.set_data(sample(50));
        table.set_filter("n0");
        table.toggle_sort("nhc");
        table.set_page(4);

        table.set_data(sample(25));

        assert_eq!(table.filter(), "n0");
        assert!(table.sort().is_some());
        assert_eq!(table.page_size(), 10);
        assert_eq!(table.page_index(), 2);
        assert_eq!(table.filtered_len(), 25);
    }

    #[test]
    fn activation_emits_cursor_record() {
        let mut table = DataTable::<Patient>::new().with_page_size(10);
        table.set_data(sample(15));

        table.move_cursor(2);
        let record = table.activate_record().unwrap();
        assert_eq!(record.nhc, "N002");
        assert_eq!(table.selected_key(), Some("N002"));

        // Cursor flows onto the next page at the bottom edge.
        table.move_cursor(20);
        assert_eq!(table.page_index(), 1);
        assert_eq!(table.cursor_key().as_deref(), Some("N010"));
        table.move_cursor(-1);
        assert_eq!(table.page_index(), 0);
        assert_eq!(table.cursor_key().as_deref(), Some("N009"));

        assert!(table.activate_row(42).is_none());
        assert_eq!(table.activate_row(0).unwrap().nhc, "N000");
    }

    #[test]
    fn cells_are_formatted_by_column_kind() {
        let mut table = DataTable::<Patient>::new();
        table.set_data([patient("N1", None, Some((1990, 3, 4)))]);

        assert_eq!(
            table.page_cells(),
            vec![vec!["N1".to_string(), "—".to_string(), "1990-03-04".to_string()]]
        );
    }

    #[test]
    fn empty_table_is_one_empty_page() {
        let mut table = DataTable::<Patient>::new();
        table.set_data(Vec::new());

        assert_eq!(table.page_count(), 1);
        assert!(table.page_records().is_empty());
        assert!(table.activate().is_none());
        table.move_cursor(1);
        assert_eq!(table.cursor(), 0);
    }
}
