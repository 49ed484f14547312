//! # Workflows Module
//!
//! High-level entry points that tie the core data model and the engine together.
//!
//! - **Extraction Workflow** ([`extract`]) - Validates a structure set, featurizes it in
//!   parallel batches and assembles the resulting [`FeatureTable`](crate::core::io::features::FeatureTable).
//! - **Filter Workflow** ([`filter`]) - Partitions material records by an allowed-element list.
//!
//! Both report their phases through a
//! [`ProgressReporter`](crate::engine::progress::ProgressReporter), so front ends can
//! render progress without knowing the internals.

pub mod extract;
pub mod filter;
