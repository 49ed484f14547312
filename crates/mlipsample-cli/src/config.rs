use crate::cli::{ExtractArgs, QueryArgs};
use crate::error::{CliError, Result};
use crate::materials::{DEFAULT_ENDPOINT, DEFAULT_PAGE_SIZE};
use mlipsample::core::filter::AllowedElements;
use mlipsample::core::models::element::Element;
use mlipsample::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_N_JOBS: usize = 4;
pub const DEFAULT_CUTOFF: f64 = 6.0;
pub const DEFAULT_N_BINS: usize = 30;
pub const DEFAULT_QUERY_ELEMENTS: [&str; 2] = ["Na", "O"];
pub const DEFAULT_OUTPUT_DIR: &str = "./filtered_structures";
pub const API_KEY_ENV: &str = "MP_API_KEY";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialExtractionConfig {
    #[serde(rename = "batch-size")]
    batch_size: Option<usize>,
    #[serde(rename = "n-jobs")]
    n_jobs: Option<usize>,
    description: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialDescriptorConfig {
    cutoff: Option<f64>,
    #[serde(rename = "n-bins")]
    n_bins: Option<usize>,
    species: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialQueryConfig {
    elements: Option<Vec<String>>,
    #[serde(rename = "allowed-elements")]
    allowed_elements: Option<Vec<String>>,
    #[serde(rename = "output-dir")]
    output_dir: Option<PathBuf>,
    #[serde(rename = "api-key")]
    api_key: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "page-size")]
    page_size: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialAppConfig {
    extraction: Option<PartialExtractionConfig>,
    descriptor: Option<PartialDescriptorConfig>,
    query: Option<PartialQueryConfig>,
}

/// Fully resolved settings for the `extract` command.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractSettings {
    pub extraction: core_config::ExtractionConfig,
    pub cutoff: f64,
    pub n_bins: usize,
    /// Explicit descriptor species; `None` means "derive from the input".
    pub species: Option<Vec<Element>>,
}

impl ExtractSettings {
    pub fn descriptor_config(&self, fallback_species: Vec<Element>) -> core_config::DescriptorConfig {
        core_config::DescriptorConfig {
            cutoff: self.cutoff,
            n_bins: self.n_bins,
            species: self.species.clone().unwrap_or(fallback_species),
        }
    }
}

/// Fully resolved settings for the `query` command.
#[derive(Debug, Clone)]
pub struct QuerySettings {
    pub elements: Vec<String>,
    pub allowed: AllowedElements,
    pub output_dir: PathBuf,
    pub api_key: String,
    pub endpoint: String,
    /// Materials requested per API call.
    pub page_size: usize,
}

impl PartialAppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the config file if one was given, otherwise starts from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_extract_args(mut self, args: &ExtractArgs) -> Result<ExtractSettings> {
        self.apply_set_values(&args.set_values)?;

        let extraction = self.extraction.take().unwrap_or_default();
        let descriptor = self.descriptor.take().unwrap_or_default();

        let mut builder = core_config::ExtractionConfigBuilder::new()
            .batch_size(
                args.batch_size
                    .or(extraction.batch_size)
                    .unwrap_or(DEFAULT_BATCH_SIZE),
            )
            .n_jobs(args.n_jobs.or(extraction.n_jobs).unwrap_or(DEFAULT_N_JOBS));
        if let Some(description) = extraction.description {
            builder = builder.description(description);
        }
        let extraction = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

        let species = descriptor
            .species
            .map(|symbols| parse_elements(&symbols, "descriptor.species"))
            .transpose()?;

        Ok(ExtractSettings {
            extraction,
            cutoff: descriptor.cutoff.unwrap_or(DEFAULT_CUTOFF),
            n_bins: descriptor.n_bins.unwrap_or(DEFAULT_N_BINS),
            species,
        })
    }

    /// Resolves query settings. The API key is taken from the command line,
    /// then the config file, then `env_api_key` (the `MP_API_KEY` variable).
    pub fn merge_with_query_args(
        mut self,
        args: &QueryArgs,
        env_api_key: Option<String>,
    ) -> Result<QuerySettings> {
        let query = self.query.take().unwrap_or_default();

        let elements = args
            .elements
            .clone()
            .or(query.elements)
            .unwrap_or_else(|| DEFAULT_QUERY_ELEMENTS.map(String::from).to_vec());
        if elements.is_empty() {
            return Err(CliError::Argument(
                "At least one query element is required.".to_string(),
            ));
        }
        parse_elements(&elements, "elements")?;

        let allowed = match query.allowed_elements {
            Some(symbols) => {
                parse_elements(&symbols, "query.allowed-elements")?;
                AllowedElements::new(symbols)
            }
            None => AllowedElements::default(),
        };

        let api_key = args
            .api_key
            .clone()
            .or(query.api_key)
            .or(env_api_key)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                CliError::Config(format!(
                    "A Materials Project API key is required via --api-key, `query.api-key` or the {} environment variable.",
                    API_KEY_ENV
                ))
            })?;

        Ok(QuerySettings {
            elements,
            allowed,
            output_dir: args
                .output_dir
                .clone()
                .or(query.output_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            api_key,
            endpoint: args
                .endpoint
                .clone()
                .or(query.endpoint)
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            page_size: query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) = kv_pair.split_once('=').ok_or_else(|| {
                CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                ))
            })?;

            match key {
                "extraction.batch-size" => {
                    self.extraction
                        .get_or_insert_with(Default::default)
                        .batch_size = Some(parse_value(key, value_str, "integer")?);
                }
                "extraction.n-jobs" => {
                    self.extraction.get_or_insert_with(Default::default).n_jobs =
                        Some(parse_value(key, value_str, "integer")?);
                }
                "extraction.description" => {
                    self.extraction
                        .get_or_insert_with(Default::default)
                        .description = Some(value_str.to_string());
                }
                "descriptor.cutoff" => {
                    self.descriptor.get_or_insert_with(Default::default).cutoff =
                        Some(parse_value(key, value_str, "float")?);
                }
                "descriptor.n-bins" => {
                    self.descriptor.get_or_insert_with(Default::default).n_bins =
                        Some(parse_value(key, value_str, "integer")?);
                }
                "descriptor.species" => {
                    self.descriptor.get_or_insert_with(Default::default).species = Some(
                        value_str
                            .split(',')
                            .map(str::trim)
                            .filter(|s| !s.is_empty())
                            .map(String::from)
                            .collect(),
                    );
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn parse_elements(symbols: &[String], field: &str) -> Result<Vec<Element>> {
    symbols
        .iter()
        .map(|s| {
            s.parse::<Element>()
                .map_err(|e| CliError::Argument(format!("{}: {}", field, e)))
        })
        .collect()
}
