// ── Runtime backend configuration ──
//
// These types describe *how* to reach the biobank backend: base URL,
// TLS trust, and request tuning. They never touch disk. The CLI/TUI
// builds a `BackendConfig` from the loaded profile and hands it in.

use std::time::Duration;

use url::Url;

use crate::table::DEFAULT_PAGE_SIZE;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict). Default.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed lab servers).
    DangerAcceptInvalid,
}

/// Configuration for talking to a single backend.
///
/// Built by CLI/TUI, passed to [`Backend`](crate::Backend). Core never reads
/// config files.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// API root every endpoint hangs off (e.g., `http://localhost:8000/api`).
    pub url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Per-request timeout. `None` leaves hung requests pending.
    pub timeout: Option<Duration>,
    /// Initial page size for data tables.
    pub page_size: usize,
}

impl BackendConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub(crate) fn transport(&self) -> biodesk_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => biodesk_api::TlsMode::System,
            TlsVerification::CustomCa(path) => biodesk_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => biodesk_api::TlsMode::DangerAcceptInvalid,
        };
        biodesk_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
