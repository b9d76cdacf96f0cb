use biodesk_api::Resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{parent_by_code, parent_by_id};
use crate::entity::{Entity, EntityKind};
use crate::form::FieldSpec;
use crate::route::Route;
use crate::table::Column;

// ── Biomodel ─────────────────────────────────────────────────────────

/// Preclinical model derived from a tumor sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Biomodel {
    pub id: Uuid,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creation_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progresses: Option<bool>,
    #[serde(default)]
    pub viability: Option<f64>,
    #[serde(default)]
    pub preclinical_trials: Option<String>,
    #[serde(default)]
    pub tumor_biobank_code: Option<String>,
}

impl Resource for Biomodel {
    const ENDPOINT: &'static str = "biomodels";
}

impl Entity for Biomodel {
    const KIND: EntityKind = EntityKind::Biomodel;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("type", "Type"),
            Column::text("status", "Status"),
            Column::number("viability", "Viability"),
            Column::boolean("progresses", "Progresses"),
            Column::date("creation_date", "Created"),
            Column::text("tumor_biobank_code", "Tumor"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("tumor_biobank_code", "Tumor Biobank Code").required(),
            FieldSpec::text("type", "Type"),
            FieldSpec::text("status", "Status"),
            FieldSpec::decimal("viability", "Viability"),
            FieldSpec::toggle("progresses", "Progresses"),
            FieldSpec::text("preclinical_trials", "Preclinical Trials"),
            FieldSpec::date("creation_date", "Creation Date"),
            FieldSpec::long_text("description", "Description"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_code(EntityKind::Tumor, self.tumor_biobank_code.as_deref())
    }
}

// ── Passage ──────────────────────────────────────────────────────────

/// One passage of a biomodel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: Uuid,
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub s_index: Option<f64>,
    #[serde(default)]
    pub viability: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub biomodel_id: Option<Uuid>,
}

impl Resource for Passage {
    const ENDPOINT: &'static str = "passages";
}

impl Entity for Passage {
    const KIND: EntityKind = EntityKind::Passage;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::number("number", "Number"),
            Column::text("status", "Status"),
            Column::number("viability", "Viability"),
            Column::number("s_index", "S-Index"),
            Column::text("biomodel_id", "Biomodel"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("biomodel_id", "Biomodel ID").required(),
            FieldSpec::integer("number", "Number"),
            FieldSpec::text("status", "Status"),
            FieldSpec::decimal("viability", "Viability"),
            FieldSpec::decimal("s_index", "S-Index"),
            FieldSpec::long_text("description", "Description"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Biomodel, self.biomodel_id)
    }
}
