//! Shared configuration for the biodesk CLI and TUI.
//!
//! TOML profiles layered with environment overrides, and translation to
//! `biodesk_core::BackendConfig`. Both binaries depend on this crate; the
//! CLI adds flag-aware wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use biodesk_core::table::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
use biodesk_core::{BackendConfig, TlsVerification};

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "BIODESK_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no backend configured (run `biodesk config init` or pass --api-url)")]
    NoProfile,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Resolve a profile by name, falling back to `default_profile`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .ok_or(ConfigError::NoProfile)?;
        match self.profiles.get_key_value(name) {
            Some((name, profile)) => Ok((name.as_str(), profile)),
            None if self.profiles.is_empty() => Err(ConfigError::NoProfile),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds. Unset or 0 waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: None,
            page_size: default_page_size(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// API root, e.g. "http://localhost:8000/api".
    pub api_url: String,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Override table page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

impl Profile {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ca_cert: None,
            insecure: None,
            timeout: None,
            page_size: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$BIODESK_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "biodesk").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("biodesk");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("BIODESK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Backend config translation ──────────────────────────────────────

/// Parse and check an API root URL.
pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.trim().parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// Build a `BackendConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_backend_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<BackendConfig, ConfigError> {
    let url = parse_api_url(&profile.api_url)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let timeout = profile
        .timeout
        .or(defaults.timeout)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    let page_size = profile.page_size.unwrap_or(defaults.page_size);
    if !PAGE_SIZE_OPTIONS.contains(&page_size) {
        return Err(ConfigError::Validation {
            field: "page_size".into(),
            reason: format!("expected one of {PAGE_SIZE_OPTIONS:?}, got {page_size}"),
        });
    }

    let mut config = BackendConfig::new(url);
    config.tls = tls;
    config.timeout = timeout;
    config.page_size = page_size;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Config {
        let mut cfg = Config::default();
        let mut lab = Profile::new("https://biobank.lab.local/api");
        lab.timeout = Some(15);
        lab.page_size = Some(50);
        cfg.profiles.insert("lab".into(), lab);
        cfg.profiles
            .insert("default".into(), Profile::new("http://localhost:8000/api"));
        cfg
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = sample();

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(loaded.default_profile.as_deref(), Some("default"));
        assert_eq!(loaded.defaults.output, "table");
        assert_eq!(loaded.defaults.page_size, 25);
        assert!(loaded.profiles.is_empty());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "default_profile = \"lab\"\n\n[defaults]\noutput = \"json\"\n\n[profiles.lab]\napi_url = \"http://lab:8000/api\"\n",
        )
        .unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.defaults.output, "json");
        assert_eq!(loaded.defaults.color, "auto");

        let (name, profile) = loaded.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(profile.api_url, "http://lab:8000/api");
    }

    #[test]
    fn unknown_profile_is_reported() {
        let cfg = sample();
        assert!(matches!(
            cfg.profile(Some("staging")),
            Err(ConfigError::UnknownProfile { .. })
        ));
        assert!(matches!(Config::default().profile(None), Err(ConfigError::NoProfile)));
    }

    #[test]
    fn profile_overrides_defaults() {
        let cfg = sample();
        let (_, lab) = cfg.profile(Some("lab")).unwrap();
        let backend = profile_to_backend_config(lab, &cfg.defaults).unwrap();

        assert_eq!(backend.url.as_str(), "https://biobank.lab.local/api");
        assert_eq!(backend.timeout, Some(Duration::from_secs(15)));
        assert_eq!(backend.page_size, 50);
        assert_eq!(backend.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn no_timeout_unless_configured() {
        let profile = Profile::new("http://localhost:8000/api");
        let backend = profile_to_backend_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(backend.timeout, None);

        let mut zero = profile.clone();
        zero.timeout = Some(0);
        let backend = profile_to_backend_config(&zero, &Defaults::default()).unwrap();
        assert_eq!(backend.timeout, None);
    }

    #[test]
    fn insecure_wins_over_ca_cert() {
        let mut profile = Profile::new("https://lab/api");
        profile.ca_cert = Some("/etc/lab-ca.pem".into());
        let backend = profile_to_backend_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(backend.tls, TlsVerification::CustomCa("/etc/lab-ca.pem".into()));

        profile.insecure = Some(true);
        let backend = profile_to_backend_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(backend.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn rejects_bad_urls_and_page_sizes() {
        let bad = Profile::new("lab.local");
        assert!(profile_to_backend_config(&bad, &Defaults::default()).is_err());

        let mut odd = Profile::new("http://lab/api");
        odd.page_size = Some(7);
        assert!(matches!(
            profile_to_backend_config(&odd, &Defaults::default()),
            Err(ConfigError::Validation { .. })
        ));
    }
}
