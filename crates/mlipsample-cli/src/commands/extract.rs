use crate::cli::ExtractArgs;
use crate::config::{ExtractSettings, PartialAppConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mlipsample::{
    core::io::{extxyz::ExtxyzFile, features::FeatureTable, traits::StructureFile},
    core::models::{element::Element, structure::Structure},
    engine::{progress::ProgressReporter, validation},
    workflows,
};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

pub async fn run(args: ExtractArgs, quiet: bool) -> Result<()> {
    if !args.input.is_file() {
        return Err(CliError::Argument(format!(
            "Input file does not exist: {}",
            args.input.display()
        )));
    }

    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_extract_args(&args)?;

    println!("Feature extraction");
    println!("  Input file:  {}", args.input.display());
    println!("  Output file: {}", args.output.display());
    println!("  Batch size:  {}", settings.extraction.batch_size);
    println!("  Workers:     {}", settings.extraction.n_jobs);

    info!("Loading structures from {:?}", &args.input);
    let structures = tokio::task::block_in_place(|| ExtxyzFile::read_from_path(&args.input))
        .map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;
    println!("Loaded {} structures.", structures.len());

    let summary = validation::validate(&structures)?;
    println!("\nStructure validation:\n{}", summary);
    if args.validate_only {
        println!("\nValidation complete. No features were extracted.");
        return Ok(());
    }

    let handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    extract_and_save(&structures, &settings, &args.output, &handler)
}

fn extract_and_save(
    structures: &[Structure],
    settings: &ExtractSettings,
    output: &Path,
    handler: &CliProgressHandler,
) -> Result<()> {
    let descriptor = settings
        .descriptor_config(species_union(structures))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    info!(
        cutoff = descriptor.cutoff(),
        n_bins = descriptor.n_bins(),
        species = ?descriptor.species().iter().map(|e| e.symbol()).collect::<Vec<_>>(),
        "Descriptor configured."
    );

    let reporter = ProgressReporter::with_callback(handler.get_callback());
    let result = tokio::task::block_in_place(|| {
        workflows::extract::run(structures, &descriptor, &settings.extraction, &reporter)
    })?;

    if !result.failed_batches.is_empty() {
        warn!(batches = ?result.failed_batches, "Skipped failed batches.");
        println!(
            "Warning: {} batch(es) failed and were skipped: {:?}",
            result.failed_batches.len(),
            result.failed_batches
        );
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    tokio::task::block_in_place(|| result.table.write_to_path(output)).map_err(|source| {
        CliError::FeatureOutput {
            path: output.to_path_buf(),
            source,
        }
    })?;

    println!("\n✓ Features written to {}", output.display());
    println!("  Structures:        {}", result.table.len());
    println!("  Feature dimension: {}", result.table.feature_dim());
    println!(
        "  Metadata:          {}",
        FeatureTable::metadata_path(output).display()
    );
    Ok(())
}

/// Every element present in the input, in atomic-number order.
fn species_union(structures: &[Structure]) -> Vec<Element> {
    structures
        .iter()
        .flat_map(|s| s.species())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use mlipsample::engine::error::EngineError;
    use std::fs;

    const TRAJECTORY: &str = "\
3
Lattice=\"8.0 0.0 0.0 0.0 8.0 0.0 0.0 0.0 8.0\" Properties=species:S:1:pos:R:3 energy=-10.5 pbc=\"T T T\"
Na 0.0 0.0 0.0
Na 2.0 0.0 0.0
O 1.0 1.0 0.0
3
Lattice=\"8.0 0.0 0.0 0.0 8.0 0.0 0.0 0.0 8.0\" Properties=species:S:1:pos:R:3 energy=-10.4 pbc=\"T T T\"
Na 0.1 0.0 0.0
Na 2.1 0.0 0.0
O 1.1 1.0 0.0
";

    fn extract_args(argv: &[&str]) -> ExtractArgs {
        let mut full = vec!["mlipsample", "extract"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Extract(args) => args,
            _ => panic!("Expected 'extract' subcommand"),
        }
    }

    #[test]
    fn species_union_spans_all_structures() {
        let structures = ExtxyzFile::read_from(&mut TRAJECTORY.as_bytes()).unwrap();
        let symbols: Vec<&str> = species_union(&structures)
            .iter()
            .map(|e| e.symbol())
            .collect();
        assert_eq!(symbols, vec!["O", "Na"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn extract_writes_table_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("aimd.extxyz");
        fs::write(&input, TRAJECTORY).unwrap();
        let output = dir.path().join("out/features.csv.gz");

        let args = extract_args(&[
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "-b",
            "1",
            "-j",
            "2",
            "-S",
            "descriptor.n-bins=10",
        ]);
        run(args, true).await.unwrap();

        let table = FeatureTable::read_from_path(&output).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.feature_dim(), 2 + 10 + 2);
        assert_eq!(table.num_atoms(), vec![3, 3]);
        assert!(FeatureTable::metadata_path(&output).exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn validate_only_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("aimd.extxyz");
        fs::write(&input, TRAJECTORY).unwrap();
        let output = dir.path().join("features.csv");

        let args = extract_args(&[
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--validate-only",
        ]);
        run(args, true).await.unwrap();

        assert!(!output.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn missing_input_is_an_argument_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("missing.extxyz");
        let args = extract_args(&["-i", input.to_str().unwrap()]);

        let result = run(args, true).await;
        assert!(matches!(result, Err(CliError::Argument(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn malformed_input_is_a_parsing_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("bad.extxyz");
        fs::write(&input, "2\ncomment\nNa 0 0 0\n").unwrap();
        let args = extract_args(&["-i", input.to_str().unwrap()]);

        let result = run(args, true).await;
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn empty_input_is_an_engine_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.extxyz");
        fs::write(&input, "\n").unwrap();
        let args = extract_args(&["-i", input.to_str().unwrap(), "--validate-only"]);

        let result = run(args, true).await;
        assert!(matches!(result, Err(CliError::Engine(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn validation_runs_before_any_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.extxyz");
        fs::write(&input, "\n").unwrap();
        let output = dir.path().join("out/features.csv");
        let args = extract_args(&[
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);

        let result = run(args, true).await;
        assert!(matches!(
            result,
            Err(CliError::Engine(EngineError::NoStructures))
        ));
        assert!(!output.parent().unwrap().exists());
    }
}
