use thiserror::Error;

use super::config::ConfigError;
use crate::core::io::features::FeatureIoError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("No structures were loaded")]
    NoStructures,

    #[error("Feature extraction produced no features ({failed_batches} of {total_batches} batches failed)")]
    NoFeatures {
        failed_batches: usize,
        total_batches: usize,
    },

    #[error("Failed to assemble feature table: {source}")]
    FeatureTable {
        #[from]
        source: FeatureIoError,
    },

    #[error("Failed to build worker pool with {n_jobs} threads: {reason}")]
    ThreadPool { n_jobs: usize, reason: String },
}
