//! Structure descriptors: maps from a structure to a fixed-length feature vector.
//!
//! Feature extraction is written against the [`Featurizer`] trait so that any
//! descriptor (a native one such as [`radial::RadialDescriptor`], or a wrapper
//! around an external model) can drive the batched extraction engine.

pub mod radial;

use crate::core::models::structure::Structure;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("Invalid descriptor configuration: {0}")]
    InvalidConfig(String),
    #[error("Structure {index} has no atoms")]
    EmptyStructure { index: usize },
    #[error("Featurizer '{name}' failed: {message}")]
    Failed { name: String, message: String },
}

/// Computes feature vectors for batches of structures.
///
/// Implementations must return exactly one vector of length [`Featurizer::dim`]
/// per input structure, in input order.
pub trait Featurizer: Send + Sync {
    /// Short identifier recorded in feature-table metadata.
    fn name(&self) -> &str;

    /// Length of every feature vector produced.
    fn dim(&self) -> usize;

    /// Featurizes a batch of structures.
    ///
    /// # Errors
    ///
    /// Returns an error if any structure in the batch cannot be featurized;
    /// the batch is then treated as failed as a whole.
    fn featurize(&self, structures: &[Structure]) -> Result<Vec<Vec<f64>>, DescriptorError>;
}
