use crate::core::descriptors::{DescriptorError, Featurizer};
use crate::core::io::features::FeatureRecord;
use crate::core::models::structure::Structure;
use crate::engine::batch::Batch;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Records produced by the extraction task, plus the ids of skipped batches.
#[derive(Debug, Default)]
pub struct ExtractionOutput {
    pub records: Vec<FeatureRecord>,
    pub failed_batches: Vec<usize>,
}

type BatchResult = Result<Vec<FeatureRecord>, (usize, DescriptorError)>;

/// Featurizes every batch, in parallel when the `parallel` feature is on.
///
/// A failing batch contributes no records; its id is logged and returned in
/// [`ExtractionOutput::failed_batches`]. Records come back sorted by
/// structure index.
#[instrument(skip_all, name = "feature_extraction_task")]
pub fn run<F>(
    structures: &[Structure],
    batches: &[Batch],
    featurizer: &F,
    reporter: &ProgressReporter,
) -> ExtractionOutput
where
    F: Featurizer + ?Sized,
{
    info!(
        batches = batches.len(),
        featurizer = featurizer.name(),
        "Starting feature extraction."
    );
    reporter.report(Progress::TaskStart {
        total_steps: batches.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = batches.iter();

    #[cfg(feature = "parallel")]
    let iterator = batches.par_iter();

    let results: Vec<BatchResult> = iterator
        .map(|batch| {
            let result = process_batch(structures, batch, featurizer);
            if let Err((batch_id, error)) = &result {
                warn!(batch_id, %error, "Batch failed and was skipped.");
                reporter.report(Progress::BatchFailed {
                    batch_id: *batch_id,
                });
            }
            reporter.report(Progress::TaskIncrement { amount: 1 });
            result
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let mut output = ExtractionOutput::default();
    for result in results {
        match result {
            Ok(records) => output.records.extend(records),
            Err((batch_id, _)) => output.failed_batches.push(batch_id),
        }
    }
    output.records.sort_by_key(|r| r.structure_index);

    info!(
        records = output.records.len(),
        failed_batches = output.failed_batches.len(),
        "Feature extraction finished."
    );
    output
}

fn process_batch<F>(structures: &[Structure], batch: &Batch, featurizer: &F) -> BatchResult
where
    F: Featurizer + ?Sized,
{
    let slice = structures.get(batch.range.clone()).ok_or_else(|| {
        (
            batch.id,
            DescriptorError::Failed {
                name: featurizer.name().to_string(),
                message: format!("batch range {:?} is out of bounds", batch.range),
            },
        )
    })?;

    let vectors = featurizer
        .featurize(slice)
        .map_err(|error| (batch.id, error))?;

    if vectors.len() != slice.len() {
        return Err((
            batch.id,
            DescriptorError::Failed {
                name: featurizer.name().to_string(),
                message: format!(
                    "returned {} feature vectors for {} structures",
                    vectors.len(),
                    slice.len()
                ),
            },
        ));
    }
    let dim = featurizer.dim();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err((
            batch.id,
            DescriptorError::Failed {
                name: featurizer.name().to_string(),
                message: format!("produced a vector of length {} (expected {dim})", bad.len()),
            },
        ));
    }

    debug!(batch_id = batch.id, size = slice.len(), "Batch featurized.");

    Ok(batch
        .range
        .clone()
        .zip(slice)
        .zip(vectors)
        .map(|((structure_index, structure), features)| FeatureRecord {
            structure_index,
            num_atoms: structure.len(),
            features,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::element::Element;
    use crate::engine::batch::make_batches;
    use nalgebra::Point3;
    use std::sync::{Arc, Mutex};

    /// Emits `[index-in-batch, atom count]` and fails on any structure with
    /// exactly `poison` atoms.
    struct CountingFeaturizer {
        poison: usize,
    }

    impl Featurizer for CountingFeaturizer {
        fn name(&self) -> &str {
            "counting"
        }
        fn dim(&self) -> usize {
            2
        }
        fn featurize(&self, structures: &[Structure]) -> Result<Vec<Vec<f64>>, DescriptorError> {
            structures
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    if s.len() == self.poison {
                        Err(DescriptorError::Failed {
                            name: "counting".into(),
                            message: "poisoned".into(),
                        })
                    } else {
                        Ok(vec![i as f64, s.len() as f64])
                    }
                })
                .collect()
        }
    }

    struct ShortFeaturizer;

    impl Featurizer for ShortFeaturizer {
        fn name(&self) -> &str {
            "short"
        }
        fn dim(&self) -> usize {
            3
        }
        fn featurize(&self, structures: &[Structure]) -> Result<Vec<Vec<f64>>, DescriptorError> {
            Ok(structures.iter().map(|_| vec![0.0]).collect())
        }
    }

    fn structures(sizes: &[usize]) -> Vec<Structure> {
        let h = Element::from_symbol("H").unwrap();
        sizes
            .iter()
            .map(|&n| {
                let mut s = Structure::new();
                for i in 0..n {
                    s.push(Atom::new(h, Point3::new(i as f64, 0.0, 0.0)));
                }
                s
            })
            .collect()
    }

    #[test]
    fn all_batches_succeed_and_records_are_ordered() {
        let structures = structures(&[1, 2, 3, 4, 5]);
        let batches = make_batches(structures.len(), 2);
        let output = run(
            &structures,
            &batches,
            &CountingFeaturizer { poison: 0 },
            &ProgressReporter::new(),
        );

        assert!(output.failed_batches.is_empty());
        assert_eq!(
            output
                .records
                .iter()
                .map(|r| r.structure_index)
                .collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(output.records[3].num_atoms, 4);
        assert_eq!(output.records[3].features, vec![1.0, 4.0]);
    }

    #[test]
    fn failing_batch_is_skipped() {
        let structures = structures(&[1, 2, 7, 4, 5]);
        let batches = make_batches(structures.len(), 2);
        let output = run(
            &structures,
            &batches,
            &CountingFeaturizer { poison: 7 },
            &ProgressReporter::new(),
        );

        assert_eq!(output.failed_batches, vec![2]);
        assert_eq!(
            output
                .records
                .iter()
                .map(|r| r.structure_index)
                .collect::<Vec<_>>(),
            vec![0, 1, 4]
        );
    }

    #[test]
    fn wrong_vector_length_fails_the_batch() {
        let structures = structures(&[1, 1]);
        let batches = make_batches(2, 1);
        let output = run(&structures, &batches, &ShortFeaturizer, &ProgressReporter::new());

        assert!(output.records.is_empty());
        assert_eq!(output.failed_batches.len(), 2);
    }

    #[test]
    fn reports_one_increment_per_batch() {
        let structures = structures(&[1, 2, 3]);
        let batches = make_batches(3, 1);
        let increments = Arc::new(Mutex::new(0u64));
        let sink = increments.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            if let Progress::TaskIncrement { amount } = p {
                *sink.lock().unwrap() += amount;
            }
        }));

        run(&structures, &batches, &CountingFeaturizer { poison: 0 }, &reporter);

        assert_eq!(*increments.lock().unwrap(), 3);
    }

    #[test]
    fn batch_failures_are_reported_while_the_task_runs() {
        let structures = structures(&[7, 7, 7]);
        let batches = make_batches(3, 1);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));

        let output = run(&structures, &batches, &CountingFeaturizer { poison: 7 }, &reporter);
        assert_eq!(output.failed_batches, vec![1, 2, 3]);

        let events = events.lock().unwrap();
        let finish = events
            .iter()
            .position(|p| matches!(p, Progress::TaskFinish))
            .unwrap();
        let mut failed: Vec<usize> = events[..finish]
            .iter()
            .filter_map(|p| match p {
                Progress::BatchFailed { batch_id } => Some(*batch_id),
                _ => None,
            })
            .collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![1, 2, 3]);
        assert!(
            !events[finish..]
                .iter()
                .any(|p| matches!(p, Progress::BatchFailed { .. }))
        );
    }
}
