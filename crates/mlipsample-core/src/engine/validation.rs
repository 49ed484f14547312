use super::error::EngineError;
use crate::core::models::cell::Cell;
use crate::core::models::element::Element;
use crate::core::models::structure::Structure;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Overview of a loaded structure set, reported before extraction starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSummary {
    pub num_structures: usize,
    /// Atom count of the first structure.
    pub first_num_atoms: usize,
    /// Elements present in the first structure.
    pub first_species: BTreeSet<Element>,
    pub first_cell: Option<Cell>,
    pub first_pbc: [bool; 3],
    pub min_atoms: usize,
    pub max_atoms: usize,
    pub num_with_energy: usize,
    pub num_with_forces: usize,
}

impl ValidationSummary {
    /// Whether every structure has the same number of atoms, as in an MD trajectory.
    pub fn is_uniform(&self) -> bool {
        self.min_atoms == self.max_atoms
    }
}

impl fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let species: Vec<&str> = self.first_species.iter().map(|e| e.symbol()).collect();
        let pbc: Vec<&str> = self
            .first_pbc
            .iter()
            .map(|&p| if p { "T" } else { "F" })
            .collect();

        writeln!(f, "Structures:      {}", self.num_structures)?;
        writeln!(f, "Atoms (first):   {}", self.first_num_atoms)?;
        writeln!(f, "Atoms (min/max): {}/{}", self.min_atoms, self.max_atoms)?;
        writeln!(f, "Elements:        {}", species.join(", "))?;
        match &self.first_cell {
            Some(cell) => {
                for axis in 0..3 {
                    let v = cell.lattice_vector(axis);
                    writeln!(
                        f,
                        "Cell {}:          [{:.4}, {:.4}, {:.4}]",
                        ['a', 'b', 'c'][axis],
                        v.x,
                        v.y,
                        v.z
                    )?;
                }
            }
            None => writeln!(f, "Cell:            none")?,
        }
        writeln!(f, "PBC:             {}", pbc.join(" "))?;
        writeln!(
            f,
            "With energy:     {}/{}",
            self.num_with_energy, self.num_structures
        )?;
        write!(
            f,
            "With forces:     {}/{}",
            self.num_with_forces, self.num_structures
        )
    }
}

/// Checks that a structure set is usable and summarizes it.
///
/// # Errors
///
/// Returns [`EngineError::NoStructures`] if `structures` is empty.
pub fn validate(structures: &[Structure]) -> Result<ValidationSummary, EngineError> {
    let first = structures.first().ok_or(EngineError::NoStructures)?;

    let (min_atoms, max_atoms) = structures
        .iter()
        .map(Structure::len)
        .fold((usize::MAX, 0), |(lo, hi), n| (lo.min(n), hi.max(n)));

    let empty = structures.iter().filter(|s| s.is_empty()).count();
    if empty > 0 {
        debug!(empty, "Some structures contain no atoms.");
    }

    let summary = ValidationSummary {
        num_structures: structures.len(),
        first_num_atoms: first.len(),
        first_species: first.species(),
        first_cell: first.cell,
        first_pbc: first.pbc(),
        min_atoms,
        max_atoms,
        num_with_energy: structures.iter().filter(|s| s.energy().is_some()).count(),
        num_with_forces: structures.iter().filter(|s| s.has_forces()).count(),
    };

    info!(
        structures = summary.num_structures,
        min_atoms, max_atoms, "Structure set validated."
    );
    Ok(summary)
}
