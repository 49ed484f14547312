use super::element::Element;
use nalgebra::{Point3, Vector3};

/// A single atom of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The chemical element of the atom.
    pub element: Element,
    /// Cartesian position in Angstroms.
    pub position: Point3<f64>,
    /// Reference force in eV/Angstrom, when the source file carries one.
    pub forces: Option<Vector3<f64>>,
}

impl Atom {
    /// Creates an atom without force information.
    pub fn new(element: Element, position: Point3<f64>) -> Self {
        Self {
            element,
            position,
            forces: None,
        }
    }

    pub fn with_forces(mut self, forces: Vector3<f64>) -> Self {
        self.forces = Some(forces);
        self
    }
}
