use crate::error::Result;
use mlipsample::core::filter::FilterOutcome;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub allowed: PathBuf,
    pub excluded: PathBuf,
}

/// File stem shared by both reports, e.g. `1_element_Na_O`.
pub fn report_stem(elements: &[String]) -> String {
    format!("1_element_{}", elements.join("_"))
}

/// Writes the allowed and excluded reports into `output_dir`, creating it
/// when missing.
pub fn write_reports(
    outcome: &FilterOutcome,
    elements: &[String],
    output_dir: &Path,
) -> Result<ReportPaths> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)?;
        info!("Created output directory {:?}", output_dir);
    }

    let stem = report_stem(elements);
    let system = elements.join("-");
    let paths = ReportPaths {
        allowed: output_dir.join(format!("{}.txt", stem)),
        excluded: output_dir.join(format!("{}_excluded.txt", stem)),
    };

    let mut writer = BufWriter::new(File::create(&paths.allowed)?);
    write_allowed(&mut writer, outcome, &system)?;
    writer.flush()?;
    info!(rows = outcome.allowed.len(), "Wrote {:?}", paths.allowed);

    let mut writer = BufWriter::new(File::create(&paths.excluded)?);
    write_excluded(&mut writer, outcome, &system)?;
    writer.flush()?;
    info!(rows = outcome.excluded.len(), "Wrote {:?}", paths.excluded);

    Ok(paths)
}

fn write_allowed(w: &mut impl Write, outcome: &FilterOutcome, system: &str) -> Result<()> {
    writeln!(w, "# {} structures (allowed elements only)", system)?;
    writeln!(w, "# material_id\tformula\telements")?;
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))?;
    for record in &outcome.allowed {
        writeln!(
            w,
            "{}\t{}\t{}",
            record.material_id,
            record.formula_pretty,
            record.sorted_elements().join(", ")
        )?;
    }
    Ok(())
}

fn write_excluded(w: &mut impl Write, outcome: &FilterOutcome, system: &str) -> Result<()> {
    writeln!(
        w,
        "# {} structures (excluded: contain disallowed elements)",
        system
    )?;
    writeln!(w, "# material_id\tformula\tdisallowed_elements")?;
    writeln!(w, "{}", "-".repeat(RULE_WIDTH))?;
    for excluded in &outcome.excluded {
        writeln!(
            w,
            "{}\t{}\t{}",
            excluded.record.material_id,
            excluded.record.formula_pretty,
            excluded.disallowed_elements.join(", ")
        )?;
    }
    Ok(())
}

pub fn summary(outcome: &FilterOutcome) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!(
        "{rule}\nFiltering summary\n{rule}\nTotal materials:    {:>6}\nAllowed materials:  {:>6}\nExcluded materials: {:>6}\n{rule}",
        outcome.total(),
        outcome.allowed.len(),
        outcome.excluded.len(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlipsample::core::filter::{AllowedElements, MaterialRecord, partition};

    fn record(id: &str, formula: &str, elements: &[&str]) -> MaterialRecord {
        MaterialRecord {
            material_id: id.to_string(),
            formula_pretty: formula.to_string(),
            elements: elements.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn outcome() -> FilterOutcome {
        partition(
            vec![
                record("mp-2352", "Na2O", &["O", "Na"]),
                record("mp-1", "NaHO", &["Na", "O", "H"]),
                record("mp-2", "Na2XeO4", &["Xe", "Na", "O"]),
            ],
            &AllowedElements::default(),
        )
    }

    fn elements() -> Vec<String> {
        vec!["Na".to_string(), "O".to_string()]
    }

    #[test]
    fn stem_joins_elements() {
        assert_eq!(report_stem(&elements()), "1_element_Na_O");
    }

    #[test]
    fn writes_both_reports_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("filtered_structures");

        let paths = write_reports(&outcome(), &elements(), &output_dir).unwrap();

        assert_eq!(paths.allowed, output_dir.join("1_element_Na_O.txt"));
        assert_eq!(paths.excluded, output_dir.join("1_element_Na_O_excluded.txt"));

        let allowed = fs::read_to_string(&paths.allowed).unwrap();
        let lines: Vec<&str> = allowed.lines().collect();
        assert_eq!(lines[0], "# Na-O structures (allowed elements only)");
        assert_eq!(lines[1], "# material_id\tformula\telements");
        assert_eq!(lines[2], "-".repeat(80));
        assert_eq!(lines[3], "mp-2352\tNa2O\tNa, O");
        assert_eq!(lines.len(), 4);

        let excluded = fs::read_to_string(&paths.excluded).unwrap();
        let lines: Vec<&str> = excluded.lines().collect();
        assert_eq!(lines[1], "# material_id\tformula\tdisallowed_elements");
        assert_eq!(lines[3], "mp-1\tNaHO\tH");
        assert_eq!(lines[4], "mp-2\tNa2XeO4\tXe");
    }

    #[test]
    fn empty_outcome_writes_headers_only() {
        let dir = tempfile::tempdir().unwrap();
        let paths =
            write_reports(&FilterOutcome::default(), &elements(), dir.path()).unwrap();
        assert_eq!(fs::read_to_string(paths.allowed).unwrap().lines().count(), 3);
        assert_eq!(fs::read_to_string(paths.excluded).unwrap().lines().count(), 3);
    }

    #[test]
    fn summary_lists_counts() {
        let text = summary(&outcome());
        assert!(text.contains("Total materials:         3"));
        assert!(text.contains("Allowed materials:       1"));
        assert!(text.contains("Excluded materials:      2"));
    }
}
