//! # Core Module
//!
//! Fundamental building blocks for working with atomic structures: the data
//! models, file formats, descriptors and chemistry helpers that the engine and
//! workflows are built on.
//!
//! ## Architecture
//!
//! - **Structure Representation** ([`models`]) - Elements, atoms, periodic cells and structures
//! - **File I/O** ([`io`]) - Multi-frame ExtXYZ files and feature tables
//! - **Descriptors** ([`descriptors`]) - Fixed-length feature vectors for structures
//! - **Element Filtering** ([`filter`]) - Allowed-element checks for material records
//! - **Geometry** ([`utils`]) - Periodic distances and cell helpers

pub mod descriptors;
pub mod filter;
pub mod io;
pub mod models;
pub mod utils;
