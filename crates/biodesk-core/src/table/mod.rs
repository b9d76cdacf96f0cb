//! Client-side table model: column specs, cell formatting, and the
//! sortable / filterable / paginated [`DataTable`].

mod data_table;

use std::cmp::Ordering;

use serde_json::Value;

pub use data_table::{DataTable, Sort, SortDirection, TableView};

/// Page sizes offered by the paginator.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

/// Page size used when nothing else is configured.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Rendered in place of a missing value.
pub const EMPTY_CELL: &str = "—";

/// How a column's cells are rendered and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    #[default]
    Text,
    Date,
    Boolean,
    Number,
}

/// One column of a table specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Field name in the serialized record.
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub kind: ColumnKind,
}

impl Column {
    const fn new(key: &'static str, label: &'static str, kind: ColumnKind) -> Self {
        Self {
            key,
            label,
            sortable: true,
            kind,
        }
    }

    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ColumnKind::Text)
    }

    pub const fn date(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ColumnKind::Date)
    }

    pub const fn boolean(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ColumnKind::Boolean)
    }

    pub const fn number(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, ColumnKind::Number)
    }

    /// Disable sorting on this column.
    pub const fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }
}

// ── Cell rendering ───────────────────────────────────────────────────

/// Render a field value for display according to the column kind.
pub fn format_cell(value: Option<&Value>, kind: ColumnKind) -> String {
    match (value, kind) {
        (None | Some(Value::Null), _) => EMPTY_CELL.into(),
        (Some(Value::Bool(b)), ColumnKind::Boolean) => if *b { "✓" } else { "✗" }.into(),
        (Some(Value::Number(n)), _) => format_number(n),
        (Some(Value::String(s)), _) => s.clone(),
        (Some(other), _) => other.to_string(),
    }
}

/// Integral floats print without a trailing `.0`.
pub fn format_number(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

/// Stringify a value for free-text filtering. `null` contributes nothing.
pub(crate) fn search_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(format_number(n)),
        other => Some(other.to_string()),
    }
}

// ── Ordering ─────────────────────────────────────────────────────────

/// Ascending comparison of two cell values.
///
/// Values are ranked null, boolean, numeric, then text. Numbers and
/// strings that parse as numbers compare numerically among themselves;
/// every other value compares by its text. The order stays total on
/// columns that mix codes like `"9"`, `"10"` and `"1a"`.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (sort_key(a), sort_key(b)) {
        (SortKey::Null, SortKey::Null) => Ordering::Equal,
        (SortKey::Bool(x), SortKey::Bool(y)) => x.cmp(&y),
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(&y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(&y),
        (x, y) => x.rank().cmp(&y.rank()),
    }
}

enum SortKey {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortKey {
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Number(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

fn sort_key(value: &Value) -> SortKey {
    match value {
        Value::Null => SortKey::Null,
        Value::Bool(b) => SortKey::Bool(*b),
        other => as_number(other).map_or_else(|| SortKey::Text(text(other)), SortKey::Number),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn nulls_render_as_dash() {
        assert_eq!(format_cell(None, ColumnKind::Text), EMPTY_CELL);
        assert_eq!(format_cell(Some(&Value::Null), ColumnKind::Date), EMPTY_CELL);
    }

    #[test]
    fn booleans_render_as_marks() {
        assert_eq!(format_cell(Some(&json!(true)), ColumnKind::Boolean), "✓");
        assert_eq!(format_cell(Some(&json!(false)), ColumnKind::Boolean), "✗");
        assert_eq!(format_cell(Some(&json!(true)), ColumnKind::Text), "true");
    }

    #[test]
    fn numbers_drop_integral_fraction() {
        assert_eq!(format_cell(Some(&json!(3.0)), ColumnKind::Number), "3");
        assert_eq!(format_cell(Some(&json!(0.85)), ColumnKind::Number), "0.85");
        assert_eq!(format_cell(Some(&json!(12)), ColumnKind::Number), "12");
    }

    #[test]
    fn comparison_puts_nulls_first_and_numbers_numerically() {
        assert_eq!(compare_values(&Value::Null, &json!(1)), Ordering::Less);
        assert_eq!(compare_values(&json!(9), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!("9"), &json!("10")), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(
            compare_values(&json!("2024-01-02"), &json!("2023-12-31")),
            Ordering::Greater
        );
    }

    fn mixed_cells() -> Vec<Value> {
        vec![
            json!("1a"),
            json!(10),
            Value::Null,
            json!("9"),
            json!(true),
            json!("10"),
            json!("b"),
            json!(2.5),
            json!(false),
            json!(" 3 "),
            Value::Null,
            json!("2024-01-02"),
            json!("10a"),
            json!(-4),
        ]
    }

    #[test]
    fn comparison_is_a_total_order_over_mixed_cells() {
        let cells = mixed_cells();
        for a in &cells {
            assert_eq!(compare_values(a, a), Ordering::Equal);
            for b in &cells {
                assert_eq!(compare_values(a, b), compare_values(b, a).reverse());
                for c in &cells {
                    if compare_values(a, b).is_le() && compare_values(b, c).is_le() {
                        assert!(compare_values(a, c).is_le(), "{a} <= {b} <= {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn mixed_cells_sort_null_bool_number_text() {
        let mut cells = mixed_cells();
        cells.sort_by(compare_values);
        assert_eq!(
            cells,
            vec![
                Value::Null,
                Value::Null,
                json!(false),
                json!(true),
                json!(-4),
                json!(2.5),
                json!(" 3 "),
                json!("9"),
                json!(10),
                json!("10"),
                json!("10a"),
                json!("1a"),
                json!("2024-01-02"),
                json!("b"),
            ]
        );

        cells.sort_by(|a, b| compare_values(a, b).reverse());
        assert!(cells.windows(2).all(|w| compare_values(&w[0], &w[1]).is_ge()));
        assert_eq!(cells.first(), Some(&json!("b")));
        assert_eq!(cells.last(), Some(&Value::Null));
    }
}
