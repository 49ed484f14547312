//! Provides input/output functionality for structure files and feature tables.
//!
//! Structure formats implement the [`traits::StructureFile`] trait so callers
//! can load whole multi-frame files with a single call. Extracted feature
//! matrices are persisted through [`features`].

pub mod extxyz;
pub mod features;
pub mod traits;
