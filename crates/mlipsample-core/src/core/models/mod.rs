//! # Core Models Module
//!
//! Data structures used to represent atomic structures throughout the crate.
//!
//! ## Key Components
//!
//! - [`element`] - Periodic table elements and symbol lookup
//! - [`atom`] - A single atom with its position and optional force
//! - [`cell`] - Lattice vectors and periodic boundary flags
//! - [`structure`] - A complete configuration with atoms, cell and per-frame info
//!
//! ## Usage
//!
//! ```ignore
//! use mlipsample::core::models::{atom::Atom, element::Element, structure::Structure};
//! use nalgebra::Point3;
//!
//! let na: Element = "Na".parse()?;
//! let o: Element = "O".parse()?;
//!
//! let mut structure = Structure::new();
//! structure.push(Atom::new(na, Point3::new(0.0, 0.0, 0.0)));
//! structure.push(Atom::new(o, Point3::new(1.2, 0.0, 0.0)));
//! assert_eq!(structure.len(), 2);
//! ```

pub mod atom;
pub mod cell;
pub mod element;
pub mod structure;
