//! Storage gateway client.
//!
//! Speaks the gateway's JSON API over one bucket:
//!
//! - `PUT  /object/{bucket}/{key}`  - write a blob
//! - `GET  /object/{bucket}/{key}`  - read a blob
//! - `GET  /list/{bucket}?prefix=`  - list keys under a prefix
//! - `POST /sign/{bucket}/{key}`    - mint a time-limited URL
//!
//! Content URLs are deterministic (`<gateway>/object/<bucket>/<key>`),
//! which is what lets the reconciler recompute the URL for any listed
//! key without a round trip.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use corpus::error::{PipelineError, Result};
use corpus::traits::store::ObjectStore;

/// HTTP [`ObjectStore`] over the storage gateway.
pub struct GatewayObjectStore {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SignResponse {
    url: String,
}

impl GatewayObjectStore {
    pub fn new(
        base_url: impl Into<String>,
        bucket: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            token,
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn check_status(status: reqwest::StatusCode, key: &str) -> Result<()> {
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PipelineError::not_found(key));
        }
        if !status.is_success() {
            return Err(PipelineError::transient(format!(
                "gateway returned {status} for {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for GatewayObjectStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String> {
        let url = self.object_url(key);
        let response = self
            .authorize(self.http.put(&url))
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("put {key} failed: {e}")))?;

        Self::check_status(response.status(), key)?;
        Ok(url)
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let url = format!("{}/list/{}", self.base_url, self.bucket);
        let response = self
            .authorize(self.http.get(&url))
            .query(&[("prefix", prefix)])
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("list {prefix} failed: {e}")))?;

        Self::check_status(response.status(), prefix)?;

        let entries: Vec<ListEntry> = response
            .json()
            .await
            .map_err(|e| PipelineError::transient(format!("list payload: {e}")))?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .authorize(self.http.get(self.object_url(key)))
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("get {key} failed: {e}")))?;

        Self::check_status(response.status(), key)?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::transient(format!("get {key} body failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/object/{}/{key}", self.base_url, self.bucket)
    }

    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let url = format!("{}/sign/{}/{key}", self.base_url, self.bucket);
        let response = self
            .authorize(self.http.post(&url))
            .json(&json!({ "expires_in": expires_in.as_secs() }))
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("sign {key} failed: {e}")))?;

        Self::check_status(response.status(), key)?;

        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::transient(format!("sign payload: {e}")))?;
        Ok(signed.url)
    }
}
