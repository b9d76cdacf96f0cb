use thiserror::Error;

/// Top-level error type for the `biodesk-api` crate.
///
/// Splits into local precondition failures, raised before any request
/// leaves the process, and remote-call failures carrying whatever the
/// backend or the transport reported. `biodesk-core` maps these into
/// screen-level status and notifications.
#[derive(Debug, Error)]
pub enum Error {
    // ── Local preconditions ─────────────────────────────────────────
    /// A caller-supplied argument is unusable (e.g. an empty identifier).
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error, or a base URL that cannot carry a path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (unreadable or malformed CA certificate).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success HTTP status returned by the backend.
    ///
    /// `message` is the FastAPI `detail` field when the body carries one,
    /// otherwise the raw body or the status line.
    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying by hand.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => matches!(status, 502..=504),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the failure happened locally, before any request.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. } | Self::InvalidUrl(_) | Self::Tls(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_only_for_404() {
        let err = Error::Api {
            status: 404,
            message: "Patient not found".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(404));

        let err = Error::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(!err.is_not_found());
        assert!(err.is_transient());
    }

    #[test]
    fn invalid_argument_is_local() {
        let err = Error::InvalidArgument {
            message: "ID is required".into(),
        };
        assert!(err.is_local());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Invalid argument: ID is required");
    }
}
