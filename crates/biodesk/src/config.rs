//! CLI configuration: thin wrapper around `biodesk_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --insecure, --timeout).

use biodesk_core::BackendConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use biodesk_config::{
    Config, Profile, config_path, load_config_or_default, parse_api_url,
    profile_to_backend_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the backend configuration for this invocation.
///
/// `--api-url` bypasses profiles entirely. Otherwise the active profile
/// is used, with `--insecure` and `--timeout` layered on top.
pub fn resolve_backend(global: &GlobalOpts, config: &Config) -> Result<BackendConfig, CliError> {
    let mut profile = if let Some(ref url) = global.api_url {
        Profile::new(url.clone())
    } else {
        let name = active_profile_name(global, config);
        match config.profiles.get(&name) {
            Some(profile) => profile.clone(),
            None if config.profiles.is_empty() => {
                return Err(CliError::NoConfig {
                    path: config_path().display().to_string(),
                });
            }
            None => {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config.profiles.keys().cloned().collect::<Vec<_>>().join(", "),
                });
            }
        }
    };

    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    Ok(profile_to_backend_config(&profile, &config.defaults)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use biodesk_core::TlsVerification;
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["biodesk"];
        argv.extend_from_slice(args);
        argv.push("health");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with(names: &[&str]) -> Config {
        let mut cfg = Config::default();
        for name in names {
            cfg.profiles.insert(
                (*name).to_owned(),
                Profile::new(format!("http://{name}.lab.local/api")),
            );
        }
        cfg
    }

    #[test]
    fn api_url_flag_skips_profiles() {
        let backend =
            resolve_backend(&global(&["--api-url", "http://localhost:8000/api"]), &Config::default())
                .unwrap();
        assert_eq!(backend.url.as_str(), "http://localhost:8000/api");
        assert_eq!(backend.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn default_profile_is_used_and_flags_override_it() {
        let cfg = config_with(&["default", "staging"]);
        let backend = resolve_backend(&global(&["-k", "--timeout", "5"]), &cfg).unwrap();
        assert_eq!(backend.url.as_str(), "http://default.lab.local/api");
        assert_eq!(backend.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(backend.timeout, Some(Duration::from_secs(5)));

        let staging = resolve_backend(&global(&["-p", "staging"]), &cfg).unwrap();
        assert_eq!(staging.url.host_str(), Some("staging.lab.local"));
    }

    #[test]
    fn missing_profile_lists_alternatives() {
        let err = resolve_backend(&global(&["-p", "prod"]), &config_with(&["lab"])).unwrap_err();
        let CliError::ProfileNotFound { name, available } = err else {
            panic!("expected ProfileNotFound");
        };
        assert_eq!(name, "prod");
        assert_eq!(available, "lab");
    }

    #[test]
    fn no_profiles_means_no_config() {
        let err = resolve_backend(&global(&[]), &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }
}
