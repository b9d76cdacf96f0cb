// ── Modal form model ──
//
// Text-backed field values seeded from a record (edit) or blank (create).
// Required fields gate submission; each input kind parses its text into
// the JSON type the backend expects when the payload is built.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::entity::{Entity, EntityKind};
use crate::error::CoreError;
use crate::table::format_number;

/// JSON object sent as a create or update body.
pub type Payload = Map<String, Value>;

/// Native input type of a form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    LongText,
    /// `YYYY-MM-DD`.
    Date,
    Integer,
    Decimal,
    /// Tri-state: unset, yes, no.
    Toggle,
}

/// One field of an entity's form specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub input: InputKind,
    pub required: bool,
    /// Read-only once the record exists (identifying keys).
    pub locked_on_edit: bool,
}

impl FieldSpec {
    const fn new(key: &'static str, label: &'static str, input: InputKind) -> Self {
        Self {
            key,
            label,
            input,
            required: false,
            locked_on_edit: false,
        }
    }

    pub const fn text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, InputKind::Text)
    }

    pub const fn long_text(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, InputKind::LongText)
    }

    pub const fn date(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, InputKind::Date)
    }

    pub const fn integer(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, InputKind::Integer)
    }

    pub const fn decimal(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, InputKind::Decimal)
    }

    pub const fn toggle(key: &'static str, label: &'static str) -> Self {
        Self::new(key, label, InputKind::Toggle)
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Required, and read-only in edit mode.
    pub const fn identifying(mut self) -> Self {
        self.required = true;
        self.locked_on_edit = true;
        self
    }
}

/// Whether the form creates a new record or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { key: String },
}

/// A field whose text does not parse as its input kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{label}: {reason}")]
pub struct FormError {
    pub label: &'static str,
    pub reason: String,
}

impl From<FormError> for CoreError {
    fn from(err: FormError) -> Self {
        CoreError::ValidationFailed {
            message: err.to_string(),
        }
    }
}

/// Editable state of one modal form.
#[derive(Debug, Clone)]
pub struct FormModel {
    kind: EntityKind,
    mode: FormMode,
    fields: &'static [FieldSpec],
    values: IndexMap<&'static str, String>,
}

impl FormModel {
    /// Blank form for a new `E`.
    pub fn create<E: Entity>() -> Self {
        let fields = E::form_fields();
        Self {
            kind: E::KIND,
            mode: FormMode::Create,
            fields,
            values: fields.iter().map(|f| (f.key, String::new())).collect(),
        }
    }

    /// Form seeded from an existing record.
    pub fn edit<E: Entity>(record: &E) -> Self {
        let fields = E::form_fields();
        let current = record.fields();
        Self {
            kind: E::KIND,
            mode: FormMode::Edit { key: record.key() },
            fields,
            values: fields
                .iter()
                .map(|f| (f.key, current.get(f.key).map(seed_text).unwrap_or_default()))
                .collect(),
        }
    }

    /// Preset a value, e.g. the parent key when creating from a detail page.
    pub fn with_value(mut self, key: &str, value: impl Into<String>) -> Self {
        if let Some(slot) = self.values.get_mut(key) {
            *slot = value.into();
        }
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn title(&self) -> String {
        match &self.mode {
            FormMode::Create => format!("New {}", self.kind.singular()),
            FormMode::Edit { key } => format!("Edit {} {key}", self.kind.singular()),
        }
    }

    pub fn submit_label(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Create",
            FormMode::Edit { .. } => "Save",
        }
    }

    // ── Values ───────────────────────────────────────────────────────

    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map_or("", String::as_str)
    }

    pub fn is_editable(&self, field: &FieldSpec) -> bool {
        !(field.locked_on_edit && matches!(self.mode, FormMode::Edit { .. }))
    }

    /// Set a field's text. Returns `false` for unknown or locked fields.
    pub fn set_value(&mut self, key: &str, value: impl Into<String>) -> bool {
        let Some(field) = self.fields.iter().find(|f| f.key == key) else {
            return false;
        };
        if !self.is_editable(field) {
            return false;
        }
        match self.values.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    /// Cycle a toggle field: unset → yes → no → unset.
    pub fn cycle_toggle(&mut self, key: &str) {
        let next = match self.value(key) {
            "" => "true",
            "true" => "false",
            _ => "",
        };
        self.set_value(key, next);
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Labels of required fields that are blank after trimming.
    pub fn missing_required(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.required && self.value(f.key).trim().is_empty())
            .map(|f| f.label)
            .collect()
    }

    /// Submit is allowed once every required field has content.
    pub fn can_submit(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Build the request body.
    ///
    /// Blank optional fields become `null`. Locked fields are left out in
    /// edit mode since the key travels in the URL.
    pub fn payload(&self) -> Result<Payload, FormError> {
        if let Some(label) = self.missing_required().first() {
            return Err(FormError {
                label: *label,
                reason: "is required".into(),
            });
        }

        let mut body = Map::new();
        for field in self.fields {
            if !self.is_editable(field) {
                continue;
            }
            let value = parse_input(field, self.value(field.key))?;
            body.insert(field.key.to_owned(), value);
        }
        Ok(body)
    }
}

fn seed_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => format_number(n),
        other => other.to_string(),
    }
}

fn parse_input(field: &FieldSpec, raw: &str) -> Result<Value, FormError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(Value::Null);
    }
    let invalid = |reason: &str| FormError {
        label: field.label,
        reason: reason.to_owned(),
    };

    match field.input {
        InputKind::Text | InputKind::LongText => Ok(Value::String(text.to_owned())),
        InputKind::Date => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| invalid("expected a date as YYYY-MM-DD")),
        InputKind::Integer => text
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid("expected a whole number")),
        InputKind::Decimal => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| invalid("expected a number")),
        InputKind::Toggle => match text {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("expected yes or no")),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{Passage, Tumor};

    fn filled_tumor_form() -> FormModel {
        let mut form = FormModel::create::<Tumor>();
        form.set_value("biobank_code", "BB-01");
        form.set_value("patient_nhc", "N1");
        form
    }

    #[test]
    fn create_mode_starts_blank_and_gated() {
        let form = FormModel::create::<Tumor>();

        assert_eq!(form.submit_label(), "Create");
        assert_eq!(form.title(), "New Tumor");
        assert_eq!(form.value("biobank_code"), "");
        assert!(!form.can_submit());
        assert_eq!(form.missing_required(), vec!["Biobank Code", "Patient NHC"]);
    }

    #[test]
    fn whitespace_does_not_satisfy_required() {
        let mut form = FormModel::create::<Tumor>();
        form.set_value("biobank_code", "   ");
        form.set_value("patient_nhc", "N1");

        assert!(!form.can_submit());
        assert!(form.payload().is_err());
    }

    #[test]
    fn payload_parses_native_types() {
        let mut form = filled_tumor_form();
        form.set_value("registration_date", "2024-03-01");
        form.set_value("organ", " Colon ");

        let body = form.payload().unwrap();
        assert_eq!(body["biobank_code"], json!("BB-01"));
        assert_eq!(body["organ"], json!("Colon"));
        assert_eq!(body["registration_date"], json!("2024-03-01"));
        assert_eq!(body["grade"], Value::Null);
    }

    #[test]
    fn invalid_date_is_reported_with_label() {
        let mut form = filled_tumor_form();
        form.set_value("operation_date", "03/01/2024");

        let err = form.payload().unwrap_err();
        assert_eq!(err.label, "Operation Date");
    }

    #[test]
    fn edit_mode_seeds_and_locks_key() {
        let tumor = Tumor {
            biobank_code: "BB-07".into(),
            organ: Some("Lung".into()),
            patient_nhc: "N3".into(),
            ..Tumor::default()
        };
        let mut form = FormModel::edit(&tumor);

        assert_eq!(form.submit_label(), "Save");
        assert_eq!(form.value("organ"), "Lung");
        assert!(!form.set_value("biobank_code", "BB-99"));
        assert_eq!(form.value("biobank_code"), "BB-07");

        let body = form.payload().unwrap();
        assert!(!body.contains_key("biobank_code"));
        assert_eq!(body["patient_nhc"], json!("N3"));
    }

    #[test]
    fn numbers_and_toggles() {
        let mut form = FormModel::create::<Passage>()
            .with_value("biomodel_id", "5f0c6b8e-0000-4000-8000-000000000001");
        form.set_value("number", "3");
        form.set_value("viability", "87.5");

        let body = form.payload().unwrap();
        assert_eq!(body["number"], json!(3));
        assert_eq!(body["viability"], json!(87.5));

        form.set_value("number", "three");
        assert_eq!(form.payload().unwrap_err().label, "Number");
    }

    #[test]
    fn toggle_cycles_through_unset() {
        let mut form = FormModel::create::<crate::model::LiquidBiopsy>();
        form.cycle_toggle("has_serum");
        assert_eq!(form.value("has_serum"), "true");
        form.cycle_toggle("has_serum");
        assert_eq!(form.value("has_serum"), "false");
        form.cycle_toggle("has_serum");
        assert_eq!(form.value("has_serum"), "");
    }
}
