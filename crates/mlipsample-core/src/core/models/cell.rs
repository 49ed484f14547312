use nalgebra::{Matrix3, Vector3};

/// Simulation cell described by three lattice vectors and periodicity flags.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    /// Lattice vectors stored as rows (`a`, `b`, `c`) in Angstroms.
    pub matrix: Matrix3<f64>,
    /// Periodic boundary flags along `a`, `b` and `c`.
    pub pbc: [bool; 3],
}

impl Cell {
    pub fn new(matrix: Matrix3<f64>, pbc: [bool; 3]) -> Self {
        Self { matrix, pbc }
    }

    /// Builds a periodic cell from the nine numbers of an ExtXYZ `Lattice` value.
    pub fn from_flat(values: [f64; 9], pbc: [bool; 3]) -> Self {
        Self {
            matrix: Matrix3::from_row_slice(&values),
            pbc,
        }
    }

    /// Builds a fully periodic orthorhombic cell.
    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Self {
        Self {
            matrix: Matrix3::from_diagonal(&Vector3::new(a, b, c)),
            pbc: [true; 3],
        }
    }

    pub fn flat(&self) -> [f64; 9] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    pub fn lattice_vector(&self, axis: usize) -> Vector3<f64> {
        self.matrix.row(axis).transpose()
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// A cell with no extent, as written for isolated molecules.
    pub fn is_degenerate(&self) -> bool {
        self.volume() <= f64::EPSILON
    }

    pub fn is_periodic(&self) -> bool {
        self.pbc.iter().any(|&p| p)
    }
}
