//! # mlipsample Core Library
//!
//! Structure handling and dataset preparation for studies of how training
//! structures are sampled for Machine Learning Interatomic Potentials (MLIPs).
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that file formats, numerics and
//! orchestration can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Structure`, `Cell`, `Element`),
//!   ExtXYZ and feature-table I/O, structural descriptors and element filtering.
//!
//! - **[`engine`]: The Logic Core.** Configuration, error types, progress reporting,
//!   batching and the parallel feature-extraction task.
//!
//! - **[`workflows`]: The Public API.** End-to-end procedures (feature extraction,
//!   element filtering of query results) built on the two layers below.

pub mod core;
pub mod engine;
pub mod workflows;
