use crate::cli::QueryArgs;
use crate::config::{API_KEY_ENV, PartialAppConfig, QuerySettings};
use crate::error::Result;
use crate::materials::MaterialsClient;
use crate::report::{self, ReportPaths};
use mlipsample::engine::progress::ProgressReporter;
use mlipsample::workflows;
use tracing::info;

pub async fn run(args: QueryArgs) -> Result<()> {
    let partial_config = PartialAppConfig::load(args.config.as_deref())?;
    let settings = partial_config.merge_with_query_args(&args, std::env::var(API_KEY_ENV).ok())?;
    execute(&settings).await?;
    Ok(())
}

async fn execute(settings: &QuerySettings) -> Result<ReportPaths> {
    let system = settings.elements.join("-");
    println!("Searching the Materials Project for {} materials...", system);
    info!(endpoint = %settings.endpoint, "Querying Materials Project.");

    let client = MaterialsClient::new(&settings.endpoint, &settings.api_key)?
        .with_page_size(settings.page_size);
    let records = client.search(&settings.elements).await?;
    println!("Found {} {} materials.", records.len(), system);

    println!("Filtering by allowed elements...");
    let outcome = workflows::filter::run(records, &settings.allowed, &ProgressReporter::new());
    println!("  Allowed:  {}", outcome.allowed.len());
    println!("  Excluded: {}", outcome.excluded.len());

    let paths = report::write_reports(&outcome, &settings.elements, &settings.output_dir)?;
    println!("\n✓ Allowed materials written to {}", paths.allowed.display());
    println!("✓ Excluded materials written to {}", paths.excluded.display());
    println!("\n{}", report::summary(&outcome));
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use httpmock::prelude::*;
    use mlipsample::core::filter::AllowedElements;
    use serde_json::json;
    use std::fs;

    fn settings(endpoint: String, output_dir: std::path::PathBuf) -> QuerySettings {
        QuerySettings {
            elements: vec!["Na".to_string(), "O".to_string()],
            allowed: AllowedElements::default(),
            output_dir,
            api_key: "test-key".to_string(),
            endpoint,
            page_size: 100,
        }
    }

    #[tokio::test]
    async fn query_filters_and_writes_reports() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/materials/summary/")
                .header("X-API-KEY", "test-key")
                .query_param("elements", "Na,O");
            then.status(200).json_body(json!({
                "data": [
                    {"material_id": "mp-2352", "formula_pretty": "Na2O", "elements": ["Na", "O"]},
                    {"material_id": "mp-1000", "formula_pretty": "NaHO", "elements": ["H", "Na", "O"]},
                    {"material_id": "mp-1001", "formula_pretty": "NaFeO2", "elements": ["Fe", "Na", "O"]}
                ],
                "meta": {"total_doc": 3}
            }));
        });

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("filtered_structures");
        let paths = execute(&settings(server.base_url(), output_dir))
            .await
            .unwrap();

        api_mock.assert();
        let allowed = fs::read_to_string(&paths.allowed).unwrap();
        assert!(allowed.contains("mp-2352\tNa2O\tNa, O"));
        assert!(allowed.contains("mp-1001\tNaFeO2\tFe, Na, O"));
        let excluded = fs::read_to_string(&paths.excluded).unwrap();
        assert!(excluded.contains("mp-1000\tNaHO\tH"));
    }

    #[tokio::test]
    async fn query_failure_writes_no_reports() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/materials/summary/");
            then.status(500);
        });

        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("reports");
        let result = execute(&settings(server.base_url(), output_dir.clone())).await;

        assert!(matches!(result, Err(CliError::Network(_))));
        assert!(!output_dir.exists());
    }
}
