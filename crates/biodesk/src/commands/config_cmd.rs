//! Config subcommand handlers.

use biodesk_core::table::PAGE_SIZE_OPTIONS;
use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output::{self, OutputOpts};

// ── Helpers ─────────────────────────────────────────────────────────

/// Delegate to the shared config crate's save function.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn profile_names(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

fn parse_flag<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.trim().parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `config set <key> <value>` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            config::parse_api_url(value)?;
            profile.api_url = value.trim().to_owned();
        }
        "ca_cert" | "ca-cert" => {
            profile.ca_cert = (!value.is_empty()).then(|| value.into());
        }
        "insecure" => profile.insecure = Some(parse_flag(key, value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_flag(key, value, "a number of seconds")?),
        "page_size" | "page-size" => {
            let size: usize = parse_flag(key, value, "a number")?;
            if !PAGE_SIZE_OPTIONS.contains(&size) {
                return Err(CliError::Validation {
                    field: "page_size".into(),
                    reason: format!("must be one of {PAGE_SIZE_OPTIONS:?}"),
                });
            }
            profile.page_size = Some(size);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: api_url, ca_cert, insecure, \
                     timeout, page_size"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts, opts: &OutputOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => init(),

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = if opts.format == OutputFormat::Table {
                toml::to_string_pretty(&cfg).map_err(|e| CliError::Config {
                    message: e.to_string(),
                })?
            } else {
                output::render_single(opts.format, &cfg, |_| String::new(), |c| {
                    c.default_profile.clone().unwrap_or_default()
                })?
            };
            output::print_output(&out, opts.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg
                .profiles
                .entry(profile_name.clone())
                .or_insert_with(|| Profile::new(String::new()));
            set_profile_key(profile, &key, &value)?;

            save_config(&cfg)?;
            output::print_success(opts, &format!("Set {key} on profile '{profile_name}'"));
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                output::print_note(opts, "No profiles configured. Run: biodesk config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.api_url);
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: profile_names(&cfg),
                    name,
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::print_success(opts, &format!("Default profile set to '{name}'"));
            Ok(())
        }
    }
}

/// Prompt for a profile and merge it into the existing config.
fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("biodesk configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let mut cfg = config::load_config_or_default();

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    // 2. API root
    let api_url: String = Input::new()
        .with_prompt("Backend API URL")
        .default("http://localhost:8000/api".into())
        .validate_with(|input: &String| {
            config::parse_api_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
        .map_err(prompt_err)?;

    // 3. TLS
    let insecure = api_url.starts_with("https")
        && Confirm::new()
            .with_prompt("Accept self-signed certificates?")
            .default(false)
            .interact()
            .map_err(prompt_err)?;

    // 4. Page size
    let sizes: Vec<String> = PAGE_SIZE_OPTIONS.iter().map(ToString::to_string).collect();
    let default_index = PAGE_SIZE_OPTIONS
        .iter()
        .position(|s| *s == cfg.defaults.page_size)
        .unwrap_or(0);
    let selection = Select::new()
        .with_prompt("Rows per page")
        .items(&sizes)
        .default(default_index)
        .interact()
        .map_err(prompt_err)?;

    let mut profile = Profile::new(api_url);
    profile.insecure = insecure.then_some(true);
    profile.page_size = PAGE_SIZE_OPTIONS
        .get(selection)
        .copied()
        .filter(|size| *size != cfg.defaults.page_size);

    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());

    save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", config_path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: biodesk health");

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_validates_values() {
        let mut profile = Profile::new("http://localhost:8000/api");
        set_profile_key(&mut profile, "timeout", "15").unwrap();
        set_profile_key(&mut profile, "page-size", "50").unwrap();
        set_profile_key(&mut profile, "insecure", "true").unwrap();
        assert_eq!(profile.timeout, Some(15));
        assert_eq!(profile.page_size, Some(50));
        assert_eq!(profile.insecure, Some(true));

        assert!(set_profile_key(&mut profile, "page_size", "30").is_err());
        assert!(set_profile_key(&mut profile, "api_url", "ftp://lab").is_err());
        assert!(set_profile_key(&mut profile, "site", "x").is_err());
        assert_eq!(profile.api_url, "http://localhost:8000/api");
    }

    #[test]
    fn empty_ca_cert_clears_it() {
        let mut profile = Profile::new("https://lab/api");
        set_profile_key(&mut profile, "ca_cert", "/etc/lab-ca.pem").unwrap();
        assert!(profile.ca_cert.is_some());
        set_profile_key(&mut profile, "ca_cert", "").unwrap();
        assert!(profile.ca_cert.is_none());
    }
}
