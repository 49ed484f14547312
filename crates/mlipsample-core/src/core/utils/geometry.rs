use crate::core::models::cell::Cell;
use crate::core::models::structure::Structure;
use nalgebra::{Point3, Vector3};

/// Lattice translations to consider along each axis for the given cell.
///
/// Non-periodic axes and degenerate cells contribute only the zero shift.
fn image_range(cell: Option<&Cell>, axis: usize) -> std::ops::RangeInclusive<i32> {
    match cell {
        Some(c) if c.pbc[axis] && !c.is_degenerate() => -1..=1,
        _ => 0..=0,
    }
}

/// Shortest distance between two points over the nearest periodic images.
///
/// Neighbouring images (shifts of -1, 0 and +1 lattice vectors along every
/// periodic axis) are searched, which is exact for cells whose perpendicular
/// widths exceed twice the distances of interest.
pub fn minimum_image_distance(a: &Point3<f64>, b: &Point3<f64>, cell: Option<&Cell>) -> f64 {
    let delta: Vector3<f64> = b - a;
    let Some(cell) = cell else {
        return delta.norm();
    };

    let va = cell.lattice_vector(0);
    let vb = cell.lattice_vector(1);
    let vc = cell.lattice_vector(2);

    let mut best = f64::INFINITY;
    for i in image_range(Some(cell), 0) {
        for j in image_range(Some(cell), 1) {
            for k in image_range(Some(cell), 2) {
                let shift = va * i as f64 + vb * j as f64 + vc * k as f64;
                let d = (delta + shift).norm();
                if d < best {
                    best = d;
                }
            }
        }
    }
    best
}

/// All unordered pair distances of a structure under minimum-image convention.
pub fn pair_distances(structure: &Structure) -> Vec<f64> {
    let cell = structure.cell.as_ref();
    let n = structure.len();
    let mut distances = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            distances.push(minimum_image_distance(
                &structure.atoms[i].position,
                &structure.atoms[j].position,
                cell,
            ));
        }
    }
    distances
}

/// Volume available to each atom, or `None` when the structure has no
/// usable cell.
pub fn volume_per_atom(structure: &Structure) -> Option<f64> {
    let cell = structure.cell.as_ref()?;
    if cell.is_degenerate() || structure.is_empty() {
        return None;
    }
    Some(cell.volume() / structure.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use nalgebra::Matrix3;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn distance_without_cell_is_euclidean() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(3.0, 4.0, 0.0);
        assert!(close(minimum_image_distance(&a, &b, None), 5.0));
    }

    #[test]
    fn periodic_distance_wraps_across_boundary() {
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0);
        let a = Point3::new(0.5, 0.0, 0.0);
        let b = Point3::new(9.5, 0.0, 0.0);
        assert!(close(minimum_image_distance(&a, &b, Some(&cell)), 1.0));
    }

    #[test]
    fn non_periodic_axis_does_not_wrap() {
        let mut cell = Cell::orthorhombic(10.0, 10.0, 10.0);
        cell.pbc = [false, true, true];
        let a = Point3::new(0.5, 0.0, 0.0);
        let b = Point3::new(9.5, 0.0, 0.0);
        assert!(close(minimum_image_distance(&a, &b, Some(&cell)), 9.0));
    }

    #[test]
    fn degenerate_cell_falls_back_to_plain_distance() {
        let cell = Cell::new(Matrix3::zeros(), [true; 3]);
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.0, 2.0, 0.0);
        assert!(close(minimum_image_distance(&a, &b, Some(&cell)), 2.0));
    }

    #[test]
    fn pair_distances_counts_each_pair_once() {
        let h = Element::from_symbol("H").unwrap();
        let mut s = Structure::new();
        s.push(Atom::new(h, Point3::new(0.0, 0.0, 0.0)));
        s.push(Atom::new(h, Point3::new(1.0, 0.0, 0.0)));
        s.push(Atom::new(h, Point3::new(0.0, 2.0, 0.0)));
        let d = pair_distances(&s);
        assert_eq!(d.len(), 3);
        assert!(close(d[0], 1.0));
        assert!(close(d[1], 2.0));
        assert!(close(d[2], 5.0f64.sqrt()));
    }

    #[test]
    fn volume_per_atom_requires_cell_and_atoms() {
        let o = Element::from_symbol("O").unwrap();
        let mut s = Structure::new();
        s.push(Atom::new(o, Point3::origin()));
        assert_eq!(volume_per_atom(&s), None);
        s.cell = Some(Cell::orthorhombic(2.0, 2.0, 2.0));
        s.push(Atom::new(o, Point3::new(1.0, 1.0, 1.0)));
        assert!(close(volume_per_atom(&s).unwrap(), 4.0));
    }
}
