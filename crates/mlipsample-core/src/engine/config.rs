use crate::core::descriptors::DescriptorError;
use crate::core::descriptors::radial::RadialDescriptor;
use crate::core::models::element::Element;
use thiserror::Error;

pub const DEFAULT_DESCRIPTION: &str = "Structure features from ExtXYZ file";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Number of structures handed to the featurizer at once.
    pub batch_size: usize,
    /// Number of worker threads used to process batches.
    pub n_jobs: usize,
    /// Free-text description stored in the feature-table metadata.
    pub description: String,
}

#[derive(Default)]
pub struct ExtractionConfigBuilder {
    batch_size: Option<usize>,
    n_jobs: Option<usize>,
    description: Option<String>,
}

impl ExtractionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }
    pub fn n_jobs(mut self, jobs: usize) -> Self {
        self.n_jobs = Some(jobs);
        self
    }
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn build(self) -> Result<ExtractionConfig, ConfigError> {
        let batch_size = self
            .batch_size
            .ok_or(ConfigError::MissingParameter("batch_size"))?;
        if batch_size == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        let n_jobs = self.n_jobs.ok_or(ConfigError::MissingParameter("n_jobs"))?;
        if n_jobs == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "n_jobs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(ExtractionConfig {
            batch_size,
            n_jobs,
            description: self
                .description
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        })
    }
}

/// Settings for the built-in [`RadialDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorConfig {
    /// Radial cutoff in Angstroms.
    pub cutoff: f64,
    pub n_bins: usize,
    /// Species whose fractions are tracked, in feature order.
    pub species: Vec<Element>,
}

impl DescriptorConfig {
    pub fn build(&self) -> Result<RadialDescriptor, DescriptorError> {
        RadialDescriptor::new(self.cutoff, self.n_bins, self.species.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::descriptors::Featurizer;

    #[test]
    fn builder_produces_config_with_default_description() {
        let config = ExtractionConfigBuilder::new()
            .batch_size(32)
            .n_jobs(4)
            .build()
            .unwrap();
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.n_jobs, 4);
        assert_eq!(config.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn builder_keeps_custom_description() {
        let config = ExtractionConfigBuilder::new()
            .batch_size(1)
            .n_jobs(1)
            .description("NaO AIMD 200 fs")
            .build()
            .unwrap();
        assert_eq!(config.description, "NaO AIMD 200 fs");
    }

    #[test]
    fn builder_reports_missing_parameters() {
        assert_eq!(
            ExtractionConfigBuilder::new().n_jobs(2).build(),
            Err(ConfigError::MissingParameter("batch_size"))
        );
        assert_eq!(
            ExtractionConfigBuilder::new().batch_size(2).build(),
            Err(ConfigError::MissingParameter("n_jobs"))
        );
    }

    #[test]
    fn builder_rejects_zero_values() {
        let result = ExtractionConfigBuilder::new()
            .batch_size(0)
            .n_jobs(1)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "batch_size",
                ..
            })
        ));
        let result = ExtractionConfigBuilder::new()
            .batch_size(8)
            .n_jobs(0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "n_jobs", .. })
        ));
    }

    #[test]
    fn descriptor_config_builds_radial_descriptor() {
        let config = DescriptorConfig {
            cutoff: 6.0,
            n_bins: 30,
            species: vec![
                Element::from_symbol("Na").unwrap(),
                Element::from_symbol("O").unwrap(),
            ],
        };
        let descriptor = config.build().unwrap();
        assert_eq!(descriptor.dim(), 34);

        let bad = DescriptorConfig { n_bins: 0, ..config };
        assert!(bad.build().is_err());
    }
}
