use biodesk_api::Resource;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityKind};
use crate::form::FieldSpec;
use crate::table::Column;

/// A patient, keyed by clinical history number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// Clinical history number.
    pub nhc: String,
    #[serde(default)]
    pub sex: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

impl Resource for Patient {
    const ENDPOINT: &'static str = "patients";
}

impl Entity for Patient {
    const KIND: EntityKind = EntityKind::Patient;

    fn key(&self) -> String {
        self.nhc.clone()
    }

    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::text("nhc", "NHC"),
            Column::text("sex", "Sex"),
            Column::date("birth_date", "Birth Date"),
        ];
        COLUMNS
    }

    fn form_fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::text("nhc", "NHC").identifying(),
            FieldSpec::text("sex", "Sex"),
            FieldSpec::date("birth_date", "Birth Date"),
        ];
        FIELDS
    }
}
