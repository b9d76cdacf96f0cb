// ── Core error types ──
//
// User-facing errors from biodesk-core. Screens show these verbatim in
// their status view or notification toast, so messages read as sentences
// rather than transport dumps. The `From<biodesk_api::Error>` impl sorts
// transport-layer failures into the domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Local preconditions ──────────────────────────────────────────
    #[error("{message}")]
    InvalidArgument { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Backend errors ───────────────────────────────────────────────
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Backend rejected the request (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Operation rejected by backend: {message}")]
    Rejected { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Returns `true` for failures raised before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument { .. } | Self::ValidationFailed { .. } | Self::Config { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<biodesk_api::Error> for CoreError {
    fn from(err: biodesk_api::Error) -> Self {
        match err {
            biodesk_api::Error::InvalidArgument { message } => {
                CoreError::InvalidArgument { message }
            }
            biodesk_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        status: e.status().map_or(0, |s| s.as_u16()),
                        message: e.to_string(),
                    }
                }
            }
            biodesk_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            biodesk_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS error: {msg}"),
            },
            biodesk_api::Error::Api {
                status: 404,
                message,
            } => CoreError::NotFound { message },
            biodesk_api::Error::Api { status, message } => CoreError::Api { status, message },
            biodesk_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Unexpected response: {message}"))
            }
        }
    }
}
