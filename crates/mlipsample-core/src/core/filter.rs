use phf::{Set, phf_set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Elements accepted by default when screening candidate materials.
///
/// Hydrogen, the noble gases and most heavy radioactive elements are left out.
static DEFAULT_ALLOWED: Set<&'static str> = phf_set! {
    "Li", "Be", "B", "C", "N", "O", "F", "Na", "Mg", "Al", "Si", "P", "S", "Cl", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br",
    "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb",
    "Te", "I", "Ba", "Lu", "Hf", "Ta", "W", "Ir", "Pt", "Tl", "Pb", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
};

/// A material returned by a structure database query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub material_id: String,
    pub formula_pretty: String,
    pub elements: Vec<String>,
}

impl MaterialRecord {
    /// Element symbols in alphabetical order.
    pub fn sorted_elements(&self) -> Vec<&str> {
        let mut elements: Vec<&str> = self.elements.iter().map(String::as_str).collect();
        elements.sort_unstable();
        elements
    }
}

/// A material rejected because it contains elements outside the allowed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcludedMaterial {
    pub record: MaterialRecord,
    /// Offending element symbols, sorted and deduplicated.
    pub disallowed_elements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub allowed: Vec<MaterialRecord>,
    pub excluded: Vec<ExcludedMaterial>,
}

impl FilterOutcome {
    pub fn total(&self) -> usize {
        self.allowed.len() + self.excluded.len()
    }
}

/// The set of element symbols a material may contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedElements {
    symbols: BTreeSet<String>,
}

impl AllowedElements {
    pub fn new<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            symbols: symbols.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.contains(symbol)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols of `elements` that are not allowed, sorted and deduplicated.
    pub fn disallowed<'a>(&self, elements: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        elements
            .into_iter()
            .filter(|el| !self.contains(el))
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl Default for AllowedElements {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED.iter().copied())
    }
}

/// Splits records into those whose elements are all allowed and those that
/// contain at least one disallowed element. Input order is preserved.
pub fn partition(records: Vec<MaterialRecord>, allowed: &AllowedElements) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    for record in records {
        let disallowed = allowed.disallowed(record.elements.iter().map(String::as_str));
        if disallowed.is_empty() {
            outcome.allowed.push(record);
        } else {
            outcome.excluded.push(ExcludedMaterial {
                record,
                disallowed_elements: disallowed,
            });
        }
    }
    outcome
}
