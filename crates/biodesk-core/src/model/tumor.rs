use biodesk_api::Resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::parent_by_code;
use crate::entity::{Entity, EntityKind};
use crate::form::FieldSpec;
use crate::route::Route;
use crate::table::Column;

// ── Tumor ────────────────────────────────────────────────────────────

/// A tumor sample, keyed by its biobank code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tumor {
    pub biobank_code: String,
    #[serde(default)]
    pub lab_code: Option<String>,
    #[serde(default)]
    pub classification: Option<String>,
    /// Anatomical pathology observation.
    #[serde(default)]
    pub ap_observation: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub organ: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tnm: Option<String>,
    #[serde(default)]
    pub registration_date: Option<NaiveDate>,
    #[serde(default)]
    pub operation_date: Option<NaiveDate>,
    pub patient_nhc: String,
}

impl Resource for Tumor {
    const ENDPOINT: &'static str = "tumors";
}

impl Entity for Tumor {
    const KIND: EntityKind = EntityKind::Tumor;

    fn key(&self) -> String {
        self.biobank_code.clone()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("biobank_code", "Biobank Code"),
            Column::text("lab_code", "Lab Code"),
            Column::text("classification", "Classification"),
            Column::text("organ", "Organ"),
            Column::text("grade", "Grade"),
            Column::text("status", "Status"),
            Column::text("patient_nhc", "Patient NHC"),
            Column::date("registration_date", "Registration"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("biobank_code", "Biobank Code").identifying(),
            FieldSpec::text("lab_code", "Lab Code"),
            FieldSpec::text("classification", "Classification"),
            FieldSpec::long_text("ap_observation", "AP Observation"),
            FieldSpec::text("grade", "Grade"),
            FieldSpec::text("organ", "Organ"),
            FieldSpec::text("status", "Status"),
            FieldSpec::text("tnm", "TNM"),
            FieldSpec::date("registration_date", "Registration Date"),
            FieldSpec::date("operation_date", "Operation Date"),
            FieldSpec::text("patient_nhc", "Patient NHC").required(),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_code(EntityKind::Patient, Some(&self.patient_nhc))
    }
}

// ── Liquid biopsy ────────────────────────────────────────────────────

/// Blood-derived sample drawn for a tumor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidBiopsy {
    pub id: Uuid,
    #[serde(default)]
    pub biopsy_date: Option<NaiveDate>,
    #[serde(default)]
    pub has_serum: Option<bool>,
    #[serde(default)]
    pub has_buffy: Option<bool>,
    #[serde(default)]
    pub has_plasma: Option<bool>,
    #[serde(default)]
    pub tumor_biobank_code: Option<String>,
}

impl Resource for LiquidBiopsy {
    const ENDPOINT: &'static str = "liquid-biopsies";
}

impl Entity for LiquidBiopsy {
    const KIND: EntityKind = EntityKind::LiquidBiopsy;

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("id", "ID"),
            Column::boolean("has_serum", "Serum"),
            Column::boolean("has_buffy", "Buffy Coat"),
            Column::boolean("has_plasma", "Plasma"),
            Column::date("biopsy_date", "Date"),
            Column::text("tumor_biobank_code", "Tumor"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("tumor_biobank_code", "Tumor Biobank Code").required(),
            FieldSpec::date("biopsy_date", "Biopsy Date"),
            FieldSpec::toggle("has_serum", "Serum"),
            FieldSpec::toggle("has_buffy", "Buffy Coat"),
            FieldSpec::toggle("has_plasma", "Plasma"),
        ];
        FIELDS
    }

    fn parent(&self) -> Option<Route> {
        parent_by_code(EntityKind::Tumor, self.tumor_biobank_code.as_deref())
    }
}
