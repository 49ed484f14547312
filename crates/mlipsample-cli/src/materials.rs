use crate::error::{CliError, Result};
use mlipsample::core::filter::MaterialRecord;
use serde::Deserialize;
use tracing::{debug, info, instrument};

pub const DEFAULT_ENDPOINT: &str = "https://api.materialsproject.org";

const SUMMARY_PATH: &str = "/materials/summary/";
const SUMMARY_FIELDS: &str = "material_id,formula_pretty,elements";
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Deserialize, Debug)]
struct SummaryPage {
    #[serde(default)]
    data: Vec<MaterialRecord>,
    meta: Option<PageMeta>,
}

#[derive(Deserialize, Debug)]
struct PageMeta {
    total_doc: Option<usize>,
}

/// Minimal client for the Materials Project summary search.
pub struct MaterialsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    page_size: usize,
}

impl MaterialsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mlipsample/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetches every material that contains all of `elements`.
    ///
    /// Pages are requested until the reported `total_doc` count has been
    /// collected, or a page comes back empty or short.
    #[instrument(skip_all, name = "materials_search", fields(elements = %elements.join(",")))]
    pub async fn search(&self, elements: &[String]) -> Result<Vec<MaterialRecord>> {
        if elements.is_empty() {
            return Err(CliError::Argument(
                "At least one element is required for a search.".to_string(),
            ));
        }
        let joined = elements.join(",");
        let mut records: Vec<MaterialRecord> = Vec::new();

        loop {
            let page = self.fetch_page(&joined, records.len()).await?;
            let received = page.data.len();
            let total = page.meta.and_then(|m| m.total_doc);
            records.extend(page.data);

            debug!(received, collected = records.len(), ?total, "Received page.");

            let done = match total {
                _ if received == 0 => true,
                Some(total) => records.len() >= total,
                None => received < self.page_size,
            };
            if done {
                break;
            }
        }

        info!(materials = records.len(), "Materials Project search complete.");
        Ok(records)
    }

    async fn fetch_page(&self, elements: &str, skip: usize) -> Result<SummaryPage> {
        let url = format!("{}{}", self.base_url, SUMMARY_PATH);
        let limit = self.page_size.to_string();
        let skip = skip.to_string();

        let page = self
            .http
            .get(&url)
            .header("X-API-KEY", &self.api_key)
            .header("Accept", "application/json")
            .query(&[
                ("elements", elements),
                ("_fields", SUMMARY_FIELDS),
                ("_limit", limit.as_str()),
                ("_skip", skip.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<SummaryPage>()
            .await?;
        Ok(page)
    }
}
