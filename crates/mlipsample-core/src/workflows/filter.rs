use crate::core::filter::{AllowedElements, FilterOutcome, MaterialRecord, partition};
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{debug, info, instrument};

/// Splits `records` into allowed and excluded materials.
#[instrument(skip_all, name = "filter_workflow")]
pub fn run(
    records: Vec<MaterialRecord>,
    allowed: &AllowedElements,
    reporter: &ProgressReporter,
) -> FilterOutcome {
    reporter.report(Progress::PhaseStart {
        name: "Element Filtering",
    });
    info!(
        records = records.len(),
        allowed_elements = allowed.len(),
        "Filtering materials by allowed elements."
    );

    let outcome = partition(records, allowed);

    for excluded in &outcome.excluded {
        debug!(
            material_id = %excluded.record.material_id,
            disallowed = ?excluded.disallowed_elements,
            "Material excluded."
        );
    }
    info!(
        allowed = outcome.allowed.len(),
        excluded = outcome.excluded.len(),
        "Filtering complete."
    );
    reporter.report(Progress::Message(format!(
        "{} of {} materials allowed",
        outcome.allowed.len(),
        outcome.total()
    )));
    reporter.report(Progress::PhaseFinish);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, formula: &str, elements: &[&str]) -> MaterialRecord {
        MaterialRecord {
            material_id: id.to_string(),
            formula_pretty: formula.to_string(),
            elements: elements.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn splits_records_with_default_allowed_list() {
        let records = vec![
            record("mp-1", "Na2O", &["Na", "O"]),
            record("mp-2", "NaPuO3", &["Na", "Pu", "O"]),
        ];
        let outcome = run(records, &AllowedElements::default(), &ProgressReporter::new());

        assert_eq!(outcome.allowed.len(), 1);
        assert_eq!(outcome.allowed[0].material_id, "mp-1");
        assert_eq!(outcome.excluded.len(), 1);
        assert_eq!(outcome.excluded[0].disallowed_elements, vec!["Pu".to_string()]);
    }

    #[test]
    fn reports_summary_message() {
        let messages = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = messages.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            if let Progress::Message(m) = p {
                sink.lock().unwrap().push(m);
            }
        }));

        run(
            vec![record("mp-3", "NaO2", &["Na", "O"])],
            &AllowedElements::new(["Na"]),
            &reporter,
        );

        assert_eq!(*messages.lock().unwrap(), vec!["0 of 1 materials allowed"]);
    }
}
