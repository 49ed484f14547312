//! Computational units driven by the workflows.
//!
//! Each task consumes already-validated inputs and reports progress through
//! the shared [`ProgressReporter`](crate::engine::progress::ProgressReporter).

pub mod extraction;
