use biodesk_api::Resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parent_by_id;
use crate::entity::{Entity, EntityKind};
use crate::form::FieldSpec;
use crate::route::Route;
use crate::table::Column;

// ── Trial ────────────────────────────────────────────────────────────

/// A trial run on one passage. At most one PDX, PDO and LC record shares
/// its id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    pub id: Uuid,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creation_date: Option<NaiveDate>,
    #[serde(default)]
    pub biobank_shipment: Option<bool>,
    #[serde(default)]
    pub biobank_arrival_date: Option<NaiveDate>,
    #[serde(default)]
    pub passage_id: Option<Uuid>,
}

impl Resource for Trial {
    const ENDPOINT: &'static str = "trials";
}

impl Entity for Trial {
    const KIND: EntityKind = EntityKind::Trial;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::boolean("success", "Success"),
            Column::date("creation_date", "Created"),
            Column::boolean("biobank_shipment", "Shipment"),
            Column::text("passage_id", "Passage"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("passage_id", "Passage ID").required(),
            FieldSpec::toggle("success", "Success"),
            FieldSpec::date("creation_date", "Creation Date"),
            FieldSpec::toggle("biobank_shipment", "Biobank Shipment"),
            FieldSpec::date("biobank_arrival_date", "Biobank Arrival"),
            FieldSpec::long_text("description", "Description"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Passage, self.passage_id)
    }
}

// ── Subtypes ─────────────────────────────────────────────────────────
//
// Keyed by the id of the trial they extend.

/// Patient-derived xenograft data for a trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdxTrial {
    pub id: Uuid,
    #[serde(default)]
    pub ffpe: Option<bool>,
    #[serde(default)]
    pub he_slide: Option<bool>,
    #[serde(default)]
    pub ihq_data: Option<String>,
    #[serde(default)]
    pub latency_weeks: Option<i32>,
    #[serde(default)]
    pub s_index: Option<f64>,
    #[serde(default)]
    pub scanner_magnification: Option<String>,
}

impl Resource for PdxTrial {
    const ENDPOINT: &'static str = "pdx-trials";
}

impl Entity for PdxTrial {
    const KIND: EntityKind = EntityKind::PdxTrial;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::boolean("ffpe", "FFPE"),
            Column::boolean("he_slide", "HE Slide"),
            Column::text("ihq_data", "IHQ Data"),
            Column::number("latency_weeks", "Latency (weeks)"),
            Column::number("s_index", "S-Index"),
            Column::text("scanner_magnification", "Scanner Mag."),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("id", "Trial ID").identifying(),
            FieldSpec::toggle("ffpe", "FFPE"),
            FieldSpec::toggle("he_slide", "HE Slide"),
            FieldSpec::text("ihq_data", "IHQ Data"),
            FieldSpec::integer("latency_weeks", "Latency (weeks)"),
            FieldSpec::decimal("s_index", "S-Index"),
            FieldSpec::text("scanner_magnification", "Scanner Magnification"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, Some(self.id))
    }
}

/// Patient-derived organoid data for a trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdoTrial {
    pub id: Uuid,
    #[serde(default)]
    pub drop_count: Option<i32>,
    #[serde(default)]
    pub organoid_count: Option<i32>,
    #[serde(default)]
    pub frozen_organoid_count: Option<i32>,
    #[serde(default)]
    pub plate_type: Option<String>,
    #[serde(default)]
    pub visualization_day: Option<i32>,
    #[serde(default)]
    pub assessment: Option<String>,
}

impl Resource for PdoTrial {
    const ENDPOINT: &'static str = "pdo-trials";
}

impl Entity for PdoTrial {
    const KIND: EntityKind = EntityKind::PdoTrial;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::number("drop_count", "Drops"),
            Column::number("organoid_count", "Organoids"),
            Column::number("frozen_organoid_count", "Frozen Organoids"),
            Column::text("plate_type", "Plate Type"),
            Column::number("visualization_day", "Visualization Day"),
            Column::text("assessment", "Assessment"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("id", "Trial ID").identifying(),
            FieldSpec::integer("drop_count", "Drop Count"),
            FieldSpec::integer("organoid_count", "Organoid Count"),
            FieldSpec::integer("frozen_organoid_count", "Frozen Organoid Count"),
            FieldSpec::text("plate_type", "Plate Type"),
            FieldSpec::integer("visualization_day", "Visualization Day"),
            FieldSpec::long_text("assessment", "Assessment"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, Some(self.id))
    }
}

/// Cell-line data for a trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LcTrial {
    pub id: Uuid,
    #[serde(default)]
    pub confluence: Option<f64>,
    #[serde(default)]
    pub spheroids: Option<bool>,
    #[serde(default)]
    pub digestion_date: Option<NaiveDate>,
    #[serde(default)]
    pub cell_line: Option<String>,
    #[serde(default)]
    pub plate_type: Option<String>,
}

impl Resource for LcTrial {
    const ENDPOINT: &'static str = "lc-trials";
}

impl Entity for LcTrial {
    const KIND: EntityKind = EntityKind::LcTrial;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::number("confluence", "Confluence"),
            Column::boolean("spheroids", "Spheroids"),
            Column::date("digestion_date", "Digestion Date"),
            Column::text("cell_line", "Cell Line"),
            Column::text("plate_type", "Plate Type"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("id", "Trial ID").identifying(),
            FieldSpec::decimal("confluence", "Confluence"),
            FieldSpec::toggle("spheroids", "Spheroids"),
            FieldSpec::date("digestion_date", "Digestion Date"),
            FieldSpec::text("cell_line", "Cell Line"),
            FieldSpec::text("plate_type", "Plate Type"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, Some(self.id))
    }
}
