//! Screen implementations. Each screen is a top-level Component built for
//! one route.

pub mod dashboard;
pub mod detail;
pub mod list;

use biodesk_core::{Backend, Route, with_entity};
use tokio::sync::mpsc::UnboundedSender;

use crate::component::Component;

/// Build the screen for `route`. Its bindings start fetching immediately
/// and signal `changes` whenever their state moves.
pub fn create_screen(
    route: &Route,
    backend: &Backend,
    changes: &UnboundedSender<()>,
) -> Box<dyn Component> {
    match route {
        Route::Dashboard => Box::new(dashboard::DashboardScreen::new(backend, changes)),
        Route::List(kind) => with_entity!(*kind, E => {
            Box::new(list::ListScreen::<E>::new(backend, changes)) as Box<dyn Component>
        }),
        Route::Detail(kind, key) => with_entity!(*kind, E => {
            Box::new(detail::DetailScreen::<E>::new(backend, key, changes)) as Box<dyn Component>
        }),
    }
}
