//! Data bridge: connects the active screen's bindings and the backend
//! health probe to TUI actions.
//!
//! Every binding on the mounted screen forwards its state changes into one
//! signal channel. The bridge coalesces bursts of signals into a single
//! [`Action::DataChanged`], and a side task probes `/health` so the status
//! bar can show whether the backend is reachable.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use biodesk_core::Backend;

use crate::action::Action;

const HEALTH_INTERVAL: Duration = Duration::from_secs(30);

/// Run the bridge until `cancel` fires or the signal channel closes.
pub async fn spawn_data_bridge(
    backend: Backend,
    mut changes: mpsc::UnboundedReceiver<()>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let probe = tokio::spawn(probe_health(backend, action_tx.clone(), cancel.clone()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            signal = changes.recv() => {
                if signal.is_none() {
                    break;
                }
                while changes.try_recv().is_ok() {}
                if action_tx.send(Action::DataChanged).is_err() {
                    break;
                }
            }
        }
    }

    probe.abort();
    debug!("data bridge shut down");
}

/// Probe the backend now and every [`HEALTH_INTERVAL`], reporting only
/// transitions.
async fn probe_health(
    backend: Backend,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(HEALTH_INTERVAL);
    let mut last: Option<bool> = None;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let action = match backend.health().await {
            Ok(health) => {
                debug!(status = %health.status, "backend healthy");
                Action::Connected
            }
            Err(e) => {
                warn!(error = %e, "health probe failed");
                Action::Disconnected(e.to_string())
            }
        };
        let up = matches!(action, Action::Connected);
        if last == Some(up) {
            continue;
        }
        last = Some(up);
        if action_tx.send(action).is_err() {
            break;
        }
    }
}
