//! Domain model and reactive data layer between `biodesk-api` and the UI
//! crates (CLI / TUI).
//!
//! - **[`Backend`]**: facade over one biobank backend. Vends typed
//!   [`ResourceClient`]s for direct CRUD calls and [`Binding`]s for
//!   screens that need to observe a fetch.
//!
//! - **[`Binding<T>`]**: a fetch whose request is derived from a `watch`
//!   input (a route key, say). A driver task publishes [`Remote`] states
//!   (`Idle`, `Loading`, `Ready`, `Failed`); a new request or a
//!   [`reload()`](Binding::reload) supersedes the fetch in flight.
//!
//! - **[`DataTable<T>`]**: client-side sort, filter, and pagination over a
//!   loaded list, driven by each entity's [`Column`] specification. The
//!   object-safe [`TableView`] lets one widget render any entity kind.
//!
//! - **[`StatusView`]**: the loading / error / empty placeholder a screen
//!   shows instead of content.
//!
//! - **Page flows** ([`flow`]): [`ListPage`], [`DetailPage`], and
//!   [`Dashboard`] compose the pieces above. [`FormModel`] backs the modal
//!   create and edit forms.
//!
//! - **Domain model** ([`model`]): one flat record type per backend
//!   collection, each implementing [`Entity`]. [`with_entity!`] dispatches
//!   an [`EntityKind`] to its concrete type.

pub mod backend;
pub mod binding;
pub mod config;
pub mod entity;
pub mod error;
pub mod flow;
pub mod form;
pub mod model;
pub mod route;
pub mod status;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::Backend;
pub use binding::{Binding, Remote};
pub use config::{BackendConfig, TlsVerification};
pub use entity::{Entity, EntityKind, Relation};
pub use error::CoreError;
pub use flow::{
    Dashboard, DashboardCard, DetailPage, DetailWriter, ListPage, ListWriter, RelatedPanel,
    SectionPanel, SectionState,
};
pub use form::{FieldSpec, FormError, FormMode, FormModel, InputKind, Payload};
pub use route::Route;
pub use status::StatusView;
pub use table::{Column, ColumnKind, DataTable, Sort, SortDirection, TableView};

pub use biodesk_api::{DeleteAck, Health, Resource, ResourceClient};
