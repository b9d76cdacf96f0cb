// ── Domain model ──
//
// Flat records as served by the backend. Identifying keys and required
// foreign keys are plain fields; everything else is optional and comes
// back as `null` when unset.

mod biomodel;
mod patient;
mod trial;
mod trial_records;
mod tumor;

pub use biomodel::{Biomodel, Passage};
pub use patient::Patient;
pub use trial::{LcTrial, PdoTrial, PdxTrial, Trial};
pub use trial_records::{
    Cryopreservation, Facs, GenomicSequencing, Image, Implant, MolecularData, Mouse, SizeRecord,
    UsageRecord,
};
pub use tumor::{LiquidBiopsy, Tumor};

use uuid::Uuid;

use crate::entity::EntityKind;
use crate::route::Route;

/// Detail route for an optional string foreign key.
fn parent_by_code(kind: EntityKind, code: Option<&str>) -> Option<Route> {
    code.filter(|c| !c.trim().is_empty())
        .map(|c| Route::detail(kind, c))
}

/// Detail route for an optional UUID foreign key.
fn parent_by_id(kind: EntityKind, id: Option<Uuid>) -> Option<Route> {
    id.map(|id| Route::detail(kind, id.to_string()))
}
