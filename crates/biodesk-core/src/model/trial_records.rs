// ── Trial records ──
//
// Per-trial child collections listed on the trial detail page.

use biodesk_api::Resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parent_by_id;
use crate::entity::{Entity, EntityKind};
use crate::form::FieldSpec;
use crate::route::Route;
use crate::table::Column;

/// Tumor implant placed during a PDX trial.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Implant {
    pub id: Uuid,
    #[serde(default)]
    pub implant_location: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub size_limit: Option<f64>,
    #[serde(default)]
    pub pdx_trial_id: Option<Uuid>,
}

impl Resource for Implant {
    const ENDPOINT: &'static str = "implants";
}

impl Entity for Implant {
    const KIND: EntityKind = EntityKind::Implant;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("implant_location", "Location"),
            Column::text("type", "Type"),
            Column::number("size_limit", "Size Limit"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("pdx_trial_id", "PDX Trial ID").required(),
            FieldSpec::text("implant_location", "Location"),
            FieldSpec::text("type", "Type"),
            FieldSpec::decimal("size_limit", "Size Limit"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, self.pdx_trial_id)
    }
}

/// Size measurement taken on an implant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRecord {
    pub id: Uuid,
    #[serde(default)]
    pub implant_id: Option<Uuid>,
}

impl Resource for SizeRecord {
    const ENDPOINT: &'static str = "size-records";
}

impl Entity for SizeRecord {
    const KIND: EntityKind = EntityKind::SizeRecord;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("implant_id", "Implant"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::text("implant_id", "Implant ID")];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Implant, self.implant_id)
    }
}

/// Host mouse of a PDX trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mouse {
    pub id: Uuid,
    #[serde(default)]
    pub strain: Option<String>,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub death_date: Option<NaiveDate>,
    #[serde(default)]
    pub death_cause: Option<String>,
    #[serde(default)]
    pub pdx_trial_id: Option<Uuid>,
}

impl Resource for Mouse {
    const ENDPOINT: &'static str = "mice";
}

impl Entity for Mouse {
    const KIND: EntityKind = EntityKind::Mouse;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("strain", "Strain"),
            Column::text("sex", "Sex"),
            Column::date("birth_date", "Birth Date"),
            Column::date("death_date", "Death Date"),
            Column::text("death_cause", "Death Cause"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("pdx_trial_id", "PDX Trial ID").required(),
            FieldSpec::text("strain", "Strain"),
            FieldSpec::text("sex", "Sex"),
            FieldSpec::date("birth_date", "Birth Date"),
            FieldSpec::date("death_date", "Death Date"),
            FieldSpec::text("death_cause", "Death Cause"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, self.pdx_trial_id)
    }
}

/// Consumption of trial material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: Uuid,
    #[serde(default)]
    pub usage_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub record_date: Option<NaiveDate>,
    pub trial_id: Uuid,
}

impl Resource for UsageRecord {
    const ENDPOINT: &'static str = "usage-records";
}

impl Entity for UsageRecord {
    const KIND: EntityKind = EntityKind::UsageRecord;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("usage_type", "Type"),
            Column::text("description", "Description"),
            Column::date("record_date", "Date"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("trial_id", "Trial ID").required(),
            FieldSpec::text("usage_type", "Usage Type"),
            FieldSpec::long_text("description", "Description"),
            FieldSpec::date("record_date", "Record Date"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, Some(self.trial_id))
    }
}

/// Histology image taken during a trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: Uuid,
    #[serde(default)]
    pub image_date: Option<NaiveDate>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Anatomical pathology review.
    #[serde(default)]
    pub ap_review: Option<String>,
    pub trial_id: Uuid,
}

impl Resource for Image {
    const ENDPOINT: &'static str = "images";
}

impl Entity for Image {
    const KIND: EntityKind = EntityKind::Image;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("type", "Type"),
            Column::date("image_date", "Date"),
            Column::text("ap_review", "AP Review"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("trial_id", "Trial ID").required(),
            FieldSpec::text("type", "Type"),
            FieldSpec::date("image_date", "Image Date"),
            FieldSpec::long_text("ap_review", "AP Review"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, Some(self.trial_id))
    }
}

/// Frozen vials stored from a trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cryopreservation {
    pub id: Uuid,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub cryo_date: Option<NaiveDate>,
    #[serde(default)]
    pub vial_count: Option<i32>,
    pub trial_id: Uuid,
}

impl Resource for Cryopreservation {
    const ENDPOINT: &'static str = "cryopreservations";
}

impl Entity for Cryopreservation {
    const KIND: EntityKind = EntityKind::Cryopreservation;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("location", "Location"),
            Column::date("cryo_date", "Date"),
            Column::number("vial_count", "Vials"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("trial_id", "Trial ID").required(),
            FieldSpec::text("location", "Location"),
            FieldSpec::date("cryo_date", "Cryo Date"),
            FieldSpec::integer("vial_count", "Vial Count"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, Some(self.trial_id))
    }
}

/// Flow cytometry run on an LC trial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facs {
    pub id: Uuid,
    #[serde(default)]
    pub lc_trial_id: Option<Uuid>,
}

impl Resource for Facs {
    const ENDPOINT: &'static str = "facs";
}

impl Entity for Facs {
    const KIND: EntityKind = EntityKind::Facs;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::text("lc_trial_id", "LC Trial"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::text("lc_trial_id", "LC Trial ID")];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, self.lc_trial_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomicSequencing {
    pub id: Uuid,
    #[serde(default)]
    pub trial_id: Option<Uuid>,
}

impl Resource for GenomicSequencing {
    const ENDPOINT: &'static str = "genomic-sequencings";
}

impl Entity for GenomicSequencing {
    const KIND: EntityKind = EntityKind::GenomicSequencing;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[Column::text("id", "ID"), Column::text("trial_id", "Trial")];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::text("trial_id", "Trial ID")];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, self.trial_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MolecularData {
    pub id: Uuid,
    #[serde(default)]
    pub trial_id: Option<Uuid>,
}

impl Resource for MolecularData {
    const ENDPOINT: &'static str = "molecular-data";
}

impl Entity for MolecularData {
    const KIND: EntityKind = EntityKind::MolecularData;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[Column::text("id", "ID"), Column::text("trial_id", "Trial")];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[FieldSpec::text("trial_id", "Trial ID")];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_id(EntityKind::Trial, self.trial_id)
    }
}
