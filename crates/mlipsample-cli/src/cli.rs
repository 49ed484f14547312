use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "mlipsample - Structure dataset tooling for studies of training-set sampling for machine learning interatomic potentials.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract one feature vector per structure from an ExtXYZ trajectory.
    Extract(ExtractArgs),
    /// Query the Materials Project and filter materials by allowed elements.
    Query(QueryArgs),
}

/// Arguments for the `extract` subcommand.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Path to the input ExtXYZ file (e.g., aimd.extxyz).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output feature table. A `.gz` suffix enables gzip compression.
    #[arg(short, long, value_name = "PATH", default_value = "features.csv.gz")]
    pub output: PathBuf,

    /// Number of structures per batch [default: 32]
    #[arg(short, long, value_name = "INT")]
    pub batch_size: Option<usize>,

    /// Number of worker threads [default: 4]
    #[arg(short = 'j', long, value_name = "INT")]
    pub n_jobs: Option<usize>,

    /// Only load and validate the structures, without extracting features.
    #[arg(long)]
    pub validate_only: bool,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S descriptor.cutoff=5.0
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `query` subcommand.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Elements every returned material must contain, comma-separated [default: Na,O]
    #[arg(short, long, value_name = "SYMBOLS", value_delimiter = ',')]
    pub elements: Option<Vec<String>>,

    /// Directory for the report files [default: ./filtered_structures]
    #[arg(short = 'd', long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Materials Project API key. Falls back to the config file, then MP_API_KEY.
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Base URL of the Materials Project API.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
