use super::{DescriptorError, Featurizer};
use crate::core::models::element::Element;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{pair_distances, volume_per_atom};

/// Composition and radial-distribution descriptor.
///
/// The feature vector is laid out as
///
/// 1. the fraction of atoms of each tracked species (in the configured order),
/// 2. a pair-distance histogram with `n_bins` equal bins on `(0, cutoff]`,
///    counting every unordered atom pair once under the minimum-image
///    convention and normalised by the number of atoms,
/// 3. the mean coordination number within `cutoff`,
/// 4. the cell volume per atom (zero for structures without a cell).
///
/// Distances between an atom and its own periodic images are not counted.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialDescriptor {
    cutoff: f64,
    n_bins: usize,
    species: Vec<Element>,
}

impl RadialDescriptor {
    pub const NAME: &'static str = "radial";

    /// # Errors
    ///
    /// Returns [`DescriptorError::InvalidConfig`] if `cutoff` is not a positive
    /// finite number, `n_bins` is zero, or `species` lists an element twice.
    pub fn new(cutoff: f64, n_bins: usize, species: Vec<Element>) -> Result<Self, DescriptorError> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(DescriptorError::InvalidConfig(format!(
                "cutoff must be a positive number of Angstroms, got {}",
                cutoff
            )));
        }
        if n_bins == 0 {
            return Err(DescriptorError::InvalidConfig(
                "n_bins must be at least 1".to_string(),
            ));
        }
        for (i, el) in species.iter().enumerate() {
            if species[..i].contains(el) {
                return Err(DescriptorError::InvalidConfig(format!(
                    "species '{}' is listed more than once",
                    el
                )));
            }
        }
        Ok(Self {
            cutoff,
            n_bins,
            species,
        })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn species(&self) -> &[Element] {
        &self.species
    }

    fn describe(&self, structure: &Structure) -> Vec<f64> {
        let n = structure.len() as f64;
        let mut features = Vec::with_capacity(self.dim());

        for el in &self.species {
            let count = structure.atoms.iter().filter(|a| a.element == *el).count();
            features.push(count as f64 / n);
        }

        let width = self.cutoff / self.n_bins as f64;
        let mut histogram = vec![0.0; self.n_bins];
        let mut pairs_within = 0usize;
        for d in pair_distances(structure) {
            if d <= 0.0 || d > self.cutoff {
                continue;
            }
            let bin = ((d / width).ceil() as usize)
                .saturating_sub(1)
                .min(self.n_bins - 1);
            histogram[bin] += 1.0;
            pairs_within += 1;
        }
        features.extend(histogram.into_iter().map(|c| c / n));

        features.push(2.0 * pairs_within as f64 / n);
        features.push(volume_per_atom(structure).unwrap_or(0.0));
        features
    }
}

impl Featurizer for RadialDescriptor {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dim(&self) -> usize {
        self.species.len() + self.n_bins + 2
    }

    fn featurize(&self, structures: &[Structure]) -> Result<Vec<Vec<f64>>, DescriptorError> {
        structures
            .iter()
            .enumerate()
            .map(|(index, structure)| {
                if structure.is_empty() {
                    Err(DescriptorError::EmptyStructure { index })
                } else {
                    Ok(self.describe(structure))
                }
            })
            .collect()
    }
}
