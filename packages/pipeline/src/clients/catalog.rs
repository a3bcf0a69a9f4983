//! Dataset source client over the hosted rows API.
//!
//! The catalog lives behind two endpoints: a paged rows API that
//! yields per-task metadata for one split, and a resolve endpoint that
//! serves raw file bytes under `<resolve_base>/<partition>/<file>`.
//! Both take an optional bearer token for gated datasets.

use async_trait::async_trait;
use serde::Deserialize;

use corpus::error::{PipelineError, Result};
use corpus::traits::catalog::CatalogSource;
use corpus::types::{CatalogEntry, SourcePartition};

const PAGE_SIZE: usize = 100;

/// Hosted dataset API client.
pub struct HfCatalogClient {
    http: reqwest::Client,
    rows_url: String,
    resolve_url: String,
    dataset: String,
    config: String,
    token: Option<String>,
}

/// One page of the rows API.
#[derive(Debug, Deserialize)]
struct RowsResponse {
    num_rows_total: usize,
    rows: Vec<RowEnvelope>,
}

#[derive(Debug, Deserialize)]
struct RowEnvelope {
    row: CatalogRow,
}

/// Raw row shape as served by the dataset. Column names follow the
/// upstream benchmark's capitalization.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    task_id: String,
    #[serde(rename = "Question")]
    question: String,
    #[serde(rename = "Level")]
    level: String,
    #[serde(rename = "Final answer")]
    final_answer: String,
    #[serde(default)]
    file_name: String,
    #[serde(rename = "Annotator Metadata", default)]
    annotator_metadata: serde_json::Value,
}

impl From<CatalogRow> for CatalogEntry {
    fn from(row: CatalogRow) -> Self {
        CatalogEntry {
            task_id: row.task_id,
            question: row.question,
            level: row.level,
            final_answer: row.final_answer,
            file_name: row.file_name.trim().to_string(),
            annotator_metadata: row.annotator_metadata,
        }
    }
}

impl HfCatalogClient {
    pub fn new(
        rows_url: impl Into<String>,
        resolve_url: impl Into<String>,
        dataset: impl Into<String>,
        config: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            rows_url: rows_url.into(),
            resolve_url: resolve_url.into(),
            dataset: dataset.into(),
            config: config.into(),
            token,
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn fetch_page(&self, split: &str, offset: usize) -> Result<RowsResponse> {
        let response = self
            .authorize(self.http.get(&self.rows_url))
            .query(&[
                ("dataset", self.dataset.clone()),
                ("config", self.config.clone()),
                ("split", split.to_string()),
                ("offset", offset.to_string()),
                ("length", PAGE_SIZE.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("rows request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::transient(format!(
                "rows API returned {status} for split {split}"
            )));
        }

        response
            .json::<RowsResponse>()
            .await
            .map_err(|e| PipelineError::schema_mismatch(format!("rows payload: {e}")))
    }
}

#[async_trait]
impl CatalogSource for HfCatalogClient {
    async fn fetch_catalog(&self, partition: SourcePartition) -> Result<Vec<CatalogEntry>> {
        let split = partition.as_str();
        let mut entries = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(split, offset).await?;
            let fetched = page.rows.len();
            entries.extend(page.rows.into_iter().map(|e| CatalogEntry::from(e.row)));

            if entries.len() >= page.num_rows_total || fetched == 0 {
                break;
            }
            offset += fetched;
        }

        tracing::debug!(
            partition = split,
            entries = entries.len(),
            "fetched catalog partition"
        );
        Ok(entries)
    }

    async fn fetch_bytes(&self, partition: SourcePartition, file_name: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{partition}/{file_name}", self.resolve_url);
        let response = self
            .authorize(self.http.get(&url))
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("download failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PipelineError::not_found(format!("{partition}/{file_name}")));
        }
        if !status.is_success() {
            return Err(PipelineError::transient(format!(
                "download of {file_name} returned {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::transient(format!("download body failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "hf-catalog"
    }
}
