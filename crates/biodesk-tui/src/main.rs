//! `biodesk-tui`: terminal front end for browsing and editing biobank
//! records.
//!
//! Built on [ratatui](https://ratatui.rs) over `biodesk-core`'s page
//! flows. The dashboard, each top-level collection, and every record have
//! a route; number keys (1-7) jump between collections and Esc walks back
//! through the navigation history.
//!
//! Logging is off unless `--log-file` or `-v` is given, and always goes
//! to a file so it cannot corrupt the terminal. A background data bridge
//! turns binding state changes into redraws.

mod action;
mod app;
mod component;
mod data_bridge;
mod dialog;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use biodesk_config::{Config, Profile, config_path, load_config, profile_to_backend_config};
use biodesk_core::{Backend, BackendConfig, Route};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;

/// Terminal UI for browsing and editing biobank records.
#[derive(Parser, Debug)]
#[command(name = "biodesk-tui", version, about)]
struct Cli {
    /// Route to open first, e.g. /tumors or /patients/N1
    route: Option<String>,

    /// Config profile to use
    #[arg(short, long, env = "BIODESK_PROFILE")]
    profile: Option<String>,

    /// Backend API root, bypassing profiles (e.g., http://localhost:8000/api)
    #[arg(short = 'u', long, env = "BIODESK_API_URL")]
    api_url: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path (defaults to the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable logging and raise verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn default_log_file() -> PathBuf {
    directories::ProjectDirs::from("", "", "biodesk").map_or_else(
        || std::env::temp_dir().join("biodesk-tui.log"),
        |dirs| dirs.data_dir().join("biodesk-tui.log"),
    )
}

/// Set up file-based tracing. Nothing may log to stdout/stderr while the
/// terminal is in raw mode. The returned guard flushes on drop.
fn setup_tracing(cli: &Cli) -> Result<Option<WorkerGuard>> {
    if cli.log_file.is_none() && cli.verbose == 0 {
        return Ok(None);
    }

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "biodesk_tui={log_level},biodesk_core={log_level},biodesk_api={log_level}"
        ))
    });

    let log_file = cli.log_file.clone().unwrap_or_else(default_log_file);
    let log_dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("cannot create log directory {}", log_dir.display()))?;
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("biodesk-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    Ok(Some(guard))
}

/// Flags > chosen profile > default profile. `--api-url` bypasses
/// profiles entirely.
fn resolve_backend(cli: &Cli, config: &Config) -> Result<BackendConfig> {
    let mut profile = match &cli.api_url {
        Some(url) => Profile::new(url.clone()),
        None => config
            .profile(cli.profile.as_deref())
            .map(|(_, profile)| profile.clone())
            .wrap_err_with(|| {
                format!(
                    "No backend configured in {}. Run `biodesk config init` or pass --api-url",
                    config_path().display()
                )
            })?,
    };
    if cli.insecure {
        profile.insecure = Some(true);
    }
    Ok(profile_to_backend_config(&profile, &config.defaults)?)
}

fn start_route(cli: &Cli) -> Result<Route> {
    match cli.route.as_deref() {
        None => Ok(Route::Dashboard),
        Some(path) => Route::parse(path).ok_or_else(|| eyre!("unknown route '{path}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Install panic/error hooks BEFORE entering the terminal
    tui::install_hooks()?;

    // Hold the guard so logs flush on exit
    let _log_guard = setup_tracing(&cli)?;

    // Resolve everything that can fail before the terminal switches modes.
    let config = load_config()?;
    let backend_config = resolve_backend(&cli, &config)?;
    let route = start_route(&cli)?;
    info!(url = %backend_config.url, %route, "starting biodesk-tui");

    let backend = Backend::new(backend_config)?;
    let mut app = App::new(backend, route)?;
    app.run().await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use biodesk_core::{EntityKind, TlsVerification};
    use pretty_assertions::assert_eq;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("biodesk-tui").chain(args.iter().copied())).unwrap()
    }

    fn config_with_lab() -> Config {
        let mut config = Config::default();
        let mut lab = Profile::new("https://biobank.lab.local/api");
        lab.page_size = Some(50);
        config.profiles.insert("lab".into(), lab);
        config.default_profile = Some("lab".into());
        config
    }

    #[test]
    fn default_profile_is_used() {
        let backend = resolve_backend(&cli(&[]), &config_with_lab()).unwrap();
        assert_eq!(backend.url.as_str(), "https://biobank.lab.local/api");
        assert_eq!(backend.page_size, 50);
    }

    #[test]
    fn api_url_flag_bypasses_profiles() {
        let backend =
            resolve_backend(&cli(&["-u", "http://localhost:8000/api", "-k"]), &Config::default())
                .unwrap();
        assert_eq!(backend.url.as_str(), "http://localhost:8000/api");
        assert_eq!(backend.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn missing_profiles_explain_how_to_configure() {
        let err = resolve_backend(&cli(&[]), &Config::default()).unwrap_err();
        assert!(err.to_string().contains("No backend configured"));

        let err = resolve_backend(&cli(&["-p", "ghost"]), &config_with_lab()).unwrap_err();
        assert!(err.to_string().contains("No backend configured"));
    }

    #[test]
    fn start_route_parses_paths() {
        assert_eq!(start_route(&cli(&[])).unwrap(), Route::Dashboard);
        assert_eq!(
            start_route(&cli(&["/patients/N1"])).unwrap(),
            Route::detail(EntityKind::Patient, "N1")
        );
        assert!(start_route(&cli(&["/nowhere"])).is_err());
    }
}
