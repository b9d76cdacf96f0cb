//! Clap derive structures for the `biodesk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use biodesk_core::EntityKind;
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// biodesk -- command-line access to the biobank records backend
#[derive(Debug, Parser)]
#[command(
    name = "biodesk",
    version,
    about = "Manage biobank records from the command line",
    long_about = "Browse and edit patients, tumors, biomodels, passages, trials and\n\
        their sub-records on a biobank backend.\n\n\
        Every collection has list, get, create, update and delete subcommands.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "BIODESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend API root, e.g. http://localhost:8000/api (overrides profile)
    #[arg(long, env = "BIODESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "BIODESK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "BIODESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (0 waits indefinitely)
    #[arg(long, env = "BIODESK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one key per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Patient records and demographics
    #[command(visible_alias = "patients")]
    Patient(EntityArgs),

    /// Tumor samples and biobank codes
    #[command(visible_alias = "tumors")]
    Tumor(EntityArgs),

    /// Liquid biopsy samples
    #[command(visible_alias = "liquid-biopsies")]
    LiquidBiopsy(EntityArgs),

    /// Preclinical biomodels
    #[command(visible_alias = "biomodels")]
    Biomodel(EntityArgs),

    /// Biomodel passages
    #[command(visible_alias = "passages")]
    Passage(EntityArgs),

    /// Trials (common fields)
    #[command(visible_alias = "trials")]
    Trial(EntityArgs),

    /// PDX trial details
    #[command(visible_alias = "pdx-trials")]
    PdxTrial(EntityArgs),

    /// PDO trial details
    #[command(visible_alias = "pdo-trials")]
    PdoTrial(EntityArgs),

    /// LC trial details
    #[command(visible_alias = "lc-trials")]
    LcTrial(EntityArgs),

    /// PDX implants
    #[command(visible_alias = "implants")]
    Implant(EntityArgs),

    /// Implant size measurements
    #[command(visible_alias = "size-records")]
    SizeRecord(EntityArgs),

    /// PDX mice
    #[command(visible_alias = "mice")]
    Mouse(EntityArgs),

    /// Trial usage records
    #[command(visible_alias = "usage-records")]
    UsageRecord(EntityArgs),

    /// Trial images
    #[command(visible_alias = "images")]
    Image(EntityArgs),

    /// Cryopreserved vials
    #[command(visible_alias = "cryopreservations")]
    Cryopreservation(EntityArgs),

    /// FACS measurements (LC trials)
    Facs(EntityArgs),

    /// Genomic sequencing runs
    #[command(visible_alias = "genomic-sequencings")]
    GenomicSequencing(EntityArgs),

    /// Molecular data sets
    MolecularData(EntityArgs),

    /// Record counts for the main collections
    #[command(alias = "dash")]
    Dashboard,

    /// Probe the backend's health endpoint
    Health,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

impl Command {
    /// The collection an entity subcommand addresses.
    pub fn into_entity(self) -> Result<(EntityKind, EntityArgs), Self> {
        let pair = match self {
            Self::Patient(args) => (EntityKind::Patient, args),
            Self::Tumor(args) => (EntityKind::Tumor, args),
            Self::LiquidBiopsy(args) => (EntityKind::LiquidBiopsy, args),
            Self::Biomodel(args) => (EntityKind::Biomodel, args),
            Self::Passage(args) => (EntityKind::Passage, args),
            Self::Trial(args) => (EntityKind::Trial, args),
            Self::PdxTrial(args) => (EntityKind::PdxTrial, args),
            Self::PdoTrial(args) => (EntityKind::PdoTrial, args),
            Self::LcTrial(args) => (EntityKind::LcTrial, args),
            Self::Implant(args) => (EntityKind::Implant, args),
            Self::SizeRecord(args) => (EntityKind::SizeRecord, args),
            Self::Mouse(args) => (EntityKind::Mouse, args),
            Self::UsageRecord(args) => (EntityKind::UsageRecord, args),
            Self::Image(args) => (EntityKind::Image, args),
            Self::Cryopreservation(args) => (EntityKind::Cryopreservation, args),
            Self::Facs(args) => (EntityKind::Facs, args),
            Self::GenomicSequencing(args) => (EntityKind::GenomicSequencing, args),
            Self::MolecularData(args) => (EntityKind::MolecularData, args),
            other => return Err(other),
        };
        Ok(pair)
    }
}

// ── Entity subcommands ───────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct EntityArgs {
    #[command(subcommand)]
    pub command: EntityCommand,
}

#[derive(Debug, Subcommand)]
pub enum EntityCommand {
    /// List records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record by key
    Get {
        /// Record key (NHC, biobank code, or ID)
        key: String,

        /// Also fetch child collections and trial sections
        #[arg(long, short = 'r')]
        related: bool,
    },

    /// Create a record
    #[command(alias = "new")]
    Create(WriteArgs),

    /// Update fields of an existing record
    #[command(alias = "edit")]
    Update {
        /// Record key (NHC, biobank code, or ID)
        key: String,

        #[command(flatten)]
        write: WriteArgs,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record key (NHC, biobank code, or ID)
        key: String,
    },
}

/// Fetch, filter, and ordering options for `list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Fetch a single server page of this size (1-100). Fetches everything when omitted.
    #[arg(long, short = 'l', value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: Option<u32>,

    /// Server-side offset for the page
    #[arg(long, default_value = "0", requires = "limit")]
    pub offset: u32,

    /// Keep rows whose FIELD equals VALUE (repeatable), e.g. patient_nhc=N1
    #[arg(long = "where", short = 'w', value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub matching: Vec<(String, String)>,

    /// Case-insensitive substring search over every field
    #[arg(long, short = 'f')]
    pub filter: Option<String>,

    /// Column to sort by
    #[arg(long, short = 's', value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

/// Field values for `create` and `update`.
#[derive(Debug, Args)]
pub struct WriteArgs {
    /// Set a field (repeatable), e.g. --set sex=F
    #[arg(long = "set", short = 'S', value_name = "FIELD=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Read field values from a JSON object file
    #[arg(long, short = 'F', value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

/// Parse `field=value`. The value may be empty to clear an optional field.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_owned(), value.to_owned()))
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key: api_url, ca_cert, insecure, timeout, page_size
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
