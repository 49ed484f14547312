use crate::core::descriptors::Featurizer;
use crate::core::io::features::FeatureTable;
use crate::core::models::structure::Structure;
use crate::engine::batch::{Batch, make_batches};
use crate::engine::config::ExtractionConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::tasks;
use crate::engine::tasks::extraction::ExtractionOutput;
use crate::engine::validation::{ValidationSummary, validate};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub summary: ValidationSummary,
    pub table: FeatureTable,
    /// Ids of batches that failed and contributed no rows.
    pub failed_batches: Vec<usize>,
}

/// Validates `structures`, featurizes them in batches and collects the table.
///
/// # Errors
///
/// Returns [`EngineError::NoStructures`] for empty input,
/// [`EngineError::NoFeatures`] if every batch failed, and
/// [`EngineError::ThreadPool`] if the worker pool cannot be created.
#[instrument(skip_all, name = "extraction_workflow")]
pub fn run<F>(
    structures: &[Structure],
    featurizer: &F,
    config: &ExtractionConfig,
    reporter: &ProgressReporter,
) -> Result<ExtractionResult, EngineError>
where
    F: Featurizer + ?Sized,
{
    // === Phase 1: Validation ===
    reporter.report(Progress::PhaseStart { name: "Validation" });
    let summary = validate(structures)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Batched extraction ===
    let batches = make_batches(structures.len(), config.batch_size);
    info!(
        structures = structures.len(),
        batches = batches.len(),
        batch_size = config.batch_size,
        n_jobs = config.n_jobs,
        "Extracting features."
    );
    reporter.report(Progress::PhaseStart {
        name: "Feature Extraction",
    });
    reporter.report(Progress::Message(format!(
        "{} structures in {} batches of up to {}",
        structures.len(),
        batches.len(),
        config.batch_size
    )));
    let output = extract_batches(structures, &batches, featurizer, config, reporter)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Assemble table ===
    if output.records.is_empty() {
        return Err(EngineError::NoFeatures {
            failed_batches: output.failed_batches.len(),
            total_batches: batches.len(),
        });
    }
    if !output.failed_batches.is_empty() {
        warn!(
            failed = output.failed_batches.len(),
            total = batches.len(),
            "Some batches were skipped; the feature table is incomplete."
        );
    }

    let table = FeatureTable::new(
        config.description.clone(),
        featurizer.name(),
        output.records,
    )?;

    info!(
        rows = table.len(),
        feature_dim = table.feature_dim(),
        "Extraction workflow complete."
    );
    Ok(ExtractionResult {
        summary,
        table,
        failed_batches: output.failed_batches,
    })
}

#[cfg(feature = "parallel")]
fn extract_batches<F>(
    structures: &[Structure],
    batches: &[Batch],
    featurizer: &F,
    config: &ExtractionConfig,
    reporter: &ProgressReporter,
) -> Result<ExtractionOutput, EngineError>
where
    F: Featurizer + ?Sized,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_jobs)
        .build()
        .map_err(|e| EngineError::ThreadPool {
            n_jobs: config.n_jobs,
            reason: e.to_string(),
        })?;
    Ok(pool.install(|| tasks::extraction::run(structures, batches, featurizer, reporter)))
}

#[cfg(not(feature = "parallel"))]
fn extract_batches<F>(
    structures: &[Structure],
    batches: &[Batch],
    featurizer: &F,
    _config: &ExtractionConfig,
    reporter: &ProgressReporter,
) -> Result<ExtractionOutput, EngineError>
where
    F: Featurizer + ?Sized,
{
    Ok(tasks::extraction::run(
        structures, batches, featurizer, reporter,
    ))
}
