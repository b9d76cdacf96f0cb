//! Loading / error / empty placeholder shown in place of content.

use std::fmt;

use crate::binding::Remote;

pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong";
pub const DEFAULT_EMPTY_ICON: &str = "inbox";
pub const DEFAULT_EMPTY_TITLE: &str = "No data found";
pub const DEFAULT_EMPTY_MESSAGE: &str = "There are no items to display yet.";

/// Exactly one placeholder state. Content is rendered instead of any of
/// these once data is present and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusView {
    Loading,
    /// Offers a retry that the caller wires to the binding's reload.
    Error { message: String },
    Empty {
        icon: String,
        title: String,
        message: String,
    },
}

impl StatusView {
    pub fn error(err: impl fmt::Display) -> Self {
        let message = err.to_string();
        Self::Error {
            message: if message.trim().is_empty() {
                DEFAULT_ERROR_MESSAGE.to_owned()
            } else {
                message
            },
        }
    }

    pub fn empty() -> Self {
        Self::Empty {
            icon: DEFAULT_EMPTY_ICON.into(),
            title: DEFAULT_EMPTY_TITLE.into(),
            message: DEFAULT_EMPTY_MESSAGE.into(),
        }
    }

    /// Empty state with a custom title and message.
    pub fn empty_with(
        icon: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Empty {
            icon: icon.into(),
            title: title.into(),
            message: message.into(),
        }
    }

    /// Pick the placeholder for a binding state, or `None` when content
    /// should render.
    ///
    /// An idle binding has nothing to show yet and counts as empty.
    pub fn for_remote<T>(state: &Remote<T>, is_empty: impl FnOnce(&T) -> bool) -> Option<Self> {
        match state {
            Remote::Loading => Some(Self::Loading),
            Remote::Failed(err) => Some(Self::error(err)),
            Remote::Idle => Some(Self::empty()),
            Remote::Ready(value) if is_empty(value) => Some(Self::empty()),
            Remote::Ready(_) => None,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Loading => "Loading...",
            Self::Error { .. } => "Error",
            Self::Empty { title, .. } => title,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Loading => None,
            Self::Error { message } | Self::Empty { message, .. } => Some(message),
        }
    }
}
