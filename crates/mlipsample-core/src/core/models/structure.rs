use super::atom::Atom;
use super::cell::Cell;
use super::element::Element;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A scalar value attached to a structure as per-frame metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl InfoValue {
    /// Infers the narrowest type for a raw metadata value: integer, float,
    /// boolean (`T`/`F`/`True`/`False`), falling back to text.
    pub fn infer(raw: &str) -> Self {
        if let Ok(i) = raw.parse::<i64>() {
            return InfoValue::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            return InfoValue::Float(f);
        }
        match raw {
            "T" | "True" | "true" => InfoValue::Bool(true),
            "F" | "False" | "false" => InfoValue::Bool(false),
            _ => InfoValue::Text(raw.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InfoValue::Int(i) => Some(*i as f64),
            InfoValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Int(i) => write!(f, "{}", i),
            InfoValue::Float(v) => write!(f, "{:?}", v),
            InfoValue::Bool(b) => f.write_str(if *b { "T" } else { "F" }),
            InfoValue::Text(s) => f.write_str(s),
        }
    }
}

/// One atomic configuration, such as a single frame of an MD trajectory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Structure {
    /// Atoms in file order.
    pub atoms: Vec<Atom>,
    /// Simulation cell, absent for isolated molecules.
    pub cell: Option<Cell>,
    /// Per-frame key/value metadata (energy, time step, ...).
    pub info: BTreeMap<String, InfoValue>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, cell: Cell) -> Self {
        self.cell = Some(cell);
        self
    }

    pub fn push(&mut self, atom: Atom) {
        self.atoms.push(atom);
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Distinct elements present in the structure, ordered by atomic number.
    pub fn species(&self) -> BTreeSet<Element> {
        self.atoms.iter().map(|a| a.element).collect()
    }

    pub fn chemical_symbols(&self) -> Vec<&'static str> {
        self.atoms.iter().map(|a| a.element.symbol()).collect()
    }

    /// Reference total energy, read from the `energy` info entry.
    pub fn energy(&self) -> Option<f64> {
        self.info.get("energy").and_then(InfoValue::as_f64)
    }

    pub fn pbc(&self) -> [bool; 3] {
        self.cell.map_or([false; 3], |c| c.pbc)
    }

    pub fn has_forces(&self) -> bool {
        !self.atoms.is_empty() && self.atoms.iter().all(|a| a.forces.is_some())
    }

    /// Formula string such as `ONa2`, with elements in order of
    /// atomic number.
    pub fn formula(&self) -> String {
        let mut counts: BTreeMap<Element, usize> = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.element).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(el, n)| {
                if n == 1 {
                    el.symbol().to_string()
                } else {
                    format!("{}{}", el.symbol(), n)
                }
            })
            .collect()
    }
}
