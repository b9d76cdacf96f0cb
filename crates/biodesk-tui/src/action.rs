//! Every state change in the TUI flows through an [`Action`].

use biodesk_core::Route;

use crate::dialog::{ConfirmRequest, FormRequest};

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

/// A transient toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

#[derive(Debug)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    /// Open a route, pushing the current one onto the history.
    Navigate(Route),
    /// Pop the navigation history.
    GoBack,

    // ── Data ──────────────────────────────────────────────────────
    /// Some binding on the active screen changed state.
    DataChanged,
    /// Backend health probe result.
    Connected,
    Disconnected(String),

    // ── Filter ────────────────────────────────────────────────────
    OpenFilter,
    CloseFilter,
    /// Live filter text for the active table.
    FilterInput(String),

    // ── Modals ────────────────────────────────────────────────────
    OpenForm(FormRequest),
    OpenConfirm(ConfirmRequest),

    // ── Overlays ──────────────────────────────────────────────────
    ToggleHelp,
    Notify(Notification),
}
