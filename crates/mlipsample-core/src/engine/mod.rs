//! # Engine Module
//!
//! Orchestration layer for batched, parallel feature extraction over large
//! structure sets.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Extraction and descriptor settings with validating builders
//! - **Batching** ([`batch`]) - Splitting a structure set into contiguous, numbered batches
//! - **Validation** ([`validation`]) - Sanity checks and a printable summary of loaded structures
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events for front ends
//! - **Error Handling** ([`error`]) - Engine-specific error types
//!
//! Batches are independent of each other, so the extraction task fans them out
//! over a rayon thread pool when the `parallel` feature is enabled (the default).
//! A batch whose featurization fails is logged and skipped rather than aborting
//! the whole run.

pub mod batch;
pub mod config;
pub mod error;
pub mod progress;
pub(crate) mod tasks;
pub mod validation;
