//! Command dispatch: bridges CLI args -> core calls -> output formatting.

pub mod config_cmd;
pub mod dashboard;
pub mod entity;
pub mod util;

use biodesk_core::Backend;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::output::OutputOpts;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    backend: &Backend,
    global: &GlobalOpts,
    opts: &OutputOpts,
) -> Result<(), CliError> {
    match cmd.into_entity() {
        Ok((kind, args)) => entity::handle(backend, kind, args, global, opts).await,
        Err(Command::Dashboard) => dashboard::dashboard(backend, opts).await,
        Err(Command::Health) => dashboard::health(backend, opts).await,
        // Config and Completions are handled before dispatch
        Err(other) => Err(CliError::Internal(format!(
            "command {other:?} does not talk to the backend"
        ))),
    }
}
