// ── Entity catalogue ──
//
// Every record type the backend serves, with the metadata screens need
// to render it generically: endpoint, key field, labels, table columns,
// form fields, and the foreign-key relations shown on detail pages.

use std::fmt;

use biodesk_api::Resource;
use serde_json::{Map, Value};
use strum::{EnumIter, IntoStaticStr};

use crate::form::FieldSpec;
use crate::route::Route;
use crate::table::Column;

/// Every entity collection served by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    Patient,
    Tumor,
    LiquidBiopsy,
    Biomodel,
    Passage,
    Trial,
    PdxTrial,
    PdoTrial,
    LcTrial,
    Implant,
    SizeRecord,
    Mouse,
    UsageRecord,
    Image,
    Cryopreservation,
    Facs,
    GenomicSequencing,
    MolecularData,
}

/// A child collection linked to a parent record by a foreign-key field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub child: EntityKind,
    /// Field on the child holding the parent's key.
    pub foreign_key: &'static str,
}

impl Relation {
    pub const fn new(child: EntityKind, foreign_key: &'static str) -> Self {
        Self { child, foreign_key }
    }
}

impl EntityKind {
    /// Collections shown as cards on the dashboard, in display order.
    pub const DASHBOARD: [EntityKind; 6] = [
        Self::Patient,
        Self::Tumor,
        Self::LiquidBiopsy,
        Self::Biomodel,
        Self::Passage,
        Self::Trial,
    ];

    /// Collection path segment on the backend.
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Patient => "patients",
            Self::Tumor => "tumors",
            Self::LiquidBiopsy => "liquid-biopsies",
            Self::Biomodel => "biomodels",
            Self::Passage => "passages",
            Self::Trial => "trials",
            Self::PdxTrial => "pdx-trials",
            Self::PdoTrial => "pdo-trials",
            Self::LcTrial => "lc-trials",
            Self::Implant => "implants",
            Self::SizeRecord => "size-records",
            Self::Mouse => "mice",
            Self::UsageRecord => "usage-records",
            Self::Image => "images",
            Self::Cryopreservation => "cryopreservations",
            Self::Facs => "facs",
            Self::GenomicSequencing => "genomic-sequencings",
            Self::MolecularData => "molecular-data",
        }
    }

    /// Look a kind up by its endpoint name.
    pub fn from_endpoint(endpoint: &str) -> Option<Self> {
        use strum::IntoEnumIterator;
        Self::iter().find(|kind| kind.endpoint() == endpoint)
    }

    /// Plural display label ("Liquid Biopsies").
    pub fn label(self) -> &'static str {
        match self {
            Self::Patient => "Patients",
            Self::Tumor => "Tumors",
            Self::LiquidBiopsy => "Liquid Biopsies",
            Self::Biomodel => "Biomodels",
            Self::Passage => "Passages",
            Self::Trial => "Trials",
            Self::PdxTrial => "PDX Trials",
            Self::PdoTrial => "PDO Trials",
            Self::LcTrial => "LC Trials",
            Self::Implant => "Implants",
            Self::SizeRecord => "Size Records",
            Self::Mouse => "Mice",
            Self::UsageRecord => "Usage Records",
            Self::Image => "Images",
            Self::Cryopreservation => "Cryopreservations",
            Self::Facs => "FACS",
            Self::GenomicSequencing => "Genomic Sequencings",
            Self::MolecularData => "Molecular Data",
        }
    }

    /// Singular display label ("Liquid Biopsy").
    pub fn singular(self) -> &'static str {
        match self {
            Self::Patient => "Patient",
            Self::Tumor => "Tumor",
            Self::LiquidBiopsy => "Liquid Biopsy",
            Self::Biomodel => "Biomodel",
            Self::Passage => "Passage",
            Self::Trial => "Trial",
            Self::PdxTrial => "PDX Trial",
            Self::PdoTrial => "PDO Trial",
            Self::LcTrial => "LC Trial",
            Self::Implant => "Implant",
            Self::SizeRecord => "Size Record",
            Self::Mouse => "Mouse",
            Self::UsageRecord => "Usage Record",
            Self::Image => "Image",
            Self::Cryopreservation => "Cryopreservation",
            Self::Facs => "FACS",
            Self::GenomicSequencing => "Genomic Sequencing",
            Self::MolecularData => "Molecular Data",
        }
    }

    /// Name of the identifying field.
    pub fn key_field(self) -> &'static str {
        match self {
            Self::Patient => "nhc",
            Self::Tumor => "biobank_code",
            _ => "id",
        }
    }

    /// Whether the backend generates the key on create.
    pub fn has_surrogate_key(self) -> bool {
        !matches!(
            self,
            Self::Patient | Self::Tumor | Self::PdxTrial | Self::PdoTrial | Self::LcTrial
        )
    }

    /// Child collections listed on this kind's detail page.
    pub fn relations(self) -> &'static [Relation] {
        const PATIENT: &[Relation] = &[Relation::new(EntityKind::Tumor, "patient_nhc")];
        const TUMOR: &[Relation] = &[
            Relation::new(EntityKind::Biomodel, "tumor_biobank_code"),
            Relation::new(EntityKind::LiquidBiopsy, "tumor_biobank_code"),
        ];
        const BIOMODEL: &[Relation] = &[Relation::new(EntityKind::Passage, "biomodel_id")];
        const PASSAGE: &[Relation] = &[Relation::new(EntityKind::Trial, "passage_id")];
        const IMPLANT: &[Relation] = &[Relation::new(EntityKind::SizeRecord, "implant_id")];
        const TRIAL: &[Relation] = &[
            Relation::new(EntityKind::Implant, "pdx_trial_id"),
            Relation::new(EntityKind::Mouse, "pdx_trial_id"),
            Relation::new(EntityKind::UsageRecord, "trial_id"),
            Relation::new(EntityKind::Image, "trial_id"),
            Relation::new(EntityKind::Cryopreservation, "trial_id"),
            Relation::new(EntityKind::GenomicSequencing, "trial_id"),
            Relation::new(EntityKind::MolecularData, "trial_id"),
            Relation::new(EntityKind::Facs, "lc_trial_id"),
        ];

        match self {
            Self::Patient => PATIENT,
            Self::Tumor => TUMOR,
            Self::Biomodel => BIOMODEL,
            Self::Passage => PASSAGE,
            Self::Trial => TRIAL,
            Self::Implant => IMPLANT,
            _ => &[],
        }
    }

    /// Optional 0..1 records sharing this kind's key (trial subtypes).
    pub fn sections(self) -> &'static [EntityKind] {
        match self {
            Self::Trial => &[Self::PdxTrial, Self::PdoTrial, Self::LcTrial],
            _ => &[],
        }
    }

    /// Material-style icon name, used for dashboard cards.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Patient => "person",
            Self::Tumor => "coronavirus",
            Self::LiquidBiopsy => "water_drop",
            Self::Biomodel => "science",
            Self::Passage => "swap_horiz",
            Self::Trial | Self::PdxTrial | Self::PdoTrial | Self::LcTrial => "assignment",
            _ => "description",
        }
    }

    /// One-line summary, used for dashboard cards.
    pub fn description(self) -> &'static str {
        match self {
            Self::Patient => "View and manage patient records and demographics.",
            Self::Tumor => "Track tumor samples, classifications, and biobank codes.",
            Self::LiquidBiopsy => "Manage serum, buffy coat, and plasma samples.",
            Self::Biomodel => "Preclinical biomodels derived from tumor samples.",
            Self::Passage => "Track biomodel passages, viability, and growth indices.",
            Self::Trial => "PDX, PDO, and LC trial data with detailed outcomes.",
            _ => "Trial sub-records.",
        }
    }

    /// CLI subcommand spelling ("liquid-biopsy").
    pub fn slug(self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ── Entity trait ─────────────────────────────────────────────────────

/// A record type with everything generic screens need to render it.
pub trait Entity: Resource + Clone + fmt::Debug + PartialEq {
    const KIND: EntityKind;

    /// The identifying key, as used in URLs.
    fn key(&self) -> String;

    /// List table column specification.
    fn columns() -> &'static [Column];

    /// Modal form field specification. Surrogate `id` keys are omitted.
    fn form_fields() -> &'static [FieldSpec];

    /// Route of the parent record, if the foreign key is set.
    fn parent(&self) -> Option<Route> {
        None
    }

    /// Serialized fields, in declaration order.
    fn fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    /// A single serialized field.
    fn field(&self, name: &str) -> Option<Value> {
        self.fields().remove(name)
    }

    /// Human title, e.g. "Patient N1".
    fn title(&self) -> String {
        format!("{} {}", Self::KIND.singular(), self.key())
    }
}

/// Stringify a JSON scalar for key comparison. `null` yields `None`.
pub(crate) fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ── Kind dispatch ────────────────────────────────────────────────────

/// Run a generic expression for the concrete record type behind a kind.
///
/// ```ignore
/// let count = with_entity!(kind, E => backend.resource::<E>().list_all().await?.len());
/// ```
#[macro_export]
macro_rules! with_entity {
    ($kind:expr, $E:ident => $body:expr) => {
        match $kind {
            $crate::EntityKind::Patient => {
                type $E = $crate::model::Patient;
                $body
            }
            $crate::EntityKind::Tumor => {
                type $E = $crate::model::Tumor;
                $body
            }
            $crate::EntityKind::LiquidBiopsy => {
                type $E = $crate::model::LiquidBiopsy;
                $body
            }
            $crate::EntityKind::Biomodel => {
                type $E = $crate::model::Biomodel;
                $body
            }
            $crate::EntityKind::Passage => {
                type $E = $crate::model::Passage;
                $body
            }
            $crate::EntityKind::Trial => {
                type $E = $crate::model::Trial;
                $body
            }
            $crate::EntityKind::PdxTrial => {
                type $E = $crate::model::PdxTrial;
                $body
            }
            $crate::EntityKind::PdoTrial => {
                type $E = $crate::model::PdoTrial;
                $body
            }
            $crate::EntityKind::LcTrial => {
                type $E = $crate::model::LcTrial;
                $body
            }
            $crate::EntityKind::Implant => {
                type $E = $crate::model::Implant;
                $body
            }
            $crate::EntityKind::SizeRecord => {
                type $E = $crate::model::SizeRecord;
                $body
            }
            $crate::EntityKind::Mouse => {
                type $E = $crate::model::Mouse;
                $body
            }
            $crate::EntityKind::UsageRecord => {
                type $E = $crate::model::UsageRecord;
                $body
            }
            $crate::EntityKind::Image => {
                type $E = $crate::model::Image;
                $body
            }
            $crate::EntityKind::Cryopreservation => {
                type $E = $crate::model::Cryopreservation;
                $body
            }
            $crate::EntityKind::Facs => {
                type $E = $crate::model::Facs;
                $body
            }
            $crate::EntityKind::GenomicSequencing => {
                type $E = $crate::model::GenomicSequencing;
                $body
            }
            $crate::EntityKind::MolecularData => {
                type $E = $crate::model::MolecularData;
                $body
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn endpoints_round_trip() {
        for kind in EntityKind::iter() {
            assert_eq!(EntityKind::from_endpoint(kind.endpoint()), Some(kind));
        }
        assert_eq!(EntityKind::from_endpoint("sites"), None);
    }

    #[test]
    fn slugs_are_kebab_case() {
        assert_eq!(EntityKind::LiquidBiopsy.slug(), "liquid-biopsy");
        assert_eq!(EntityKind::Facs.slug(), "facs");
        assert_eq!(EntityKind::SizeRecord.slug(), "size-record");
    }

    #[test]
    fn macro_dispatch_matches_kind() {
        for kind in EntityKind::iter() {
            let (resolved, endpoint) =
                with_entity!(kind, E => (<E as Entity>::KIND, <E as Resource>::ENDPOINT));
            assert_eq!(resolved, kind);
            assert_eq!(endpoint, kind.endpoint());
        }
    }

    #[test]
    fn relation_foreign_keys_exist_on_children() {
        for kind in EntityKind::iter() {
            for relation in kind.relations() {
                let has_field = with_entity!(relation.child, E => {
                    E::form_fields().iter().any(|f| f.key == relation.foreign_key)
                });
                assert!(has_field, "{:?} lacks {}", relation.child, relation.foreign_key);
            }
        }
    }
}
