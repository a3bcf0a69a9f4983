//! Extraction engine adapters.
//!
//! Both engines are external systems; these adapters only carry bytes
//! across their boundary. The local converter is a command that reads
//! a document on stdin and writes markdown on stdout; the partitioning
//! service is an HTTP API that returns structured elements as JSON.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use corpus::error::{PipelineError, Result};
use corpus::traits::engine::ExtractionEngine;

/// Local markdown conversion via an external command.
///
/// The configured command line is split on whitespace; the input
/// document is piped to stdin and the markdown output read from
/// stdout. A non-zero exit is a per-document engine failure.
pub struct MarkdownConvertEngine {
    program: String,
    args: Vec<String>,
}

impl MarkdownConvertEngine {
    pub fn new(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| PipelineError::Config("converter command is empty".into()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl ExtractionEngine for MarkdownConvertEngine {
    async fn extract(&self, file_name: &str, input: &[u8]) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| PipelineError::engine(format!("spawn {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| PipelineError::engine("converter stdin unavailable"))?;
        stdin
            .write_all(input)
            .await
            .map_err(|e| PipelineError::engine(format!("write to converter: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PipelineError::engine(format!("wait for converter: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::engine(format!(
                "converter failed on {file_name} ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }

    fn name(&self) -> &str {
        "markdown-convert"
    }
}

/// Remote partitioning service client.
pub struct PartitionApiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl PartitionApiClient {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| PipelineError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ExtractionEngine for PartitionApiClient {
    async fn extract(&self, file_name: &str, input: &[u8]) -> Result<Vec<u8>> {
        let mut req = self
            .http
            .post(&self.api_url)
            .header("content-type", "application/octet-stream")
            .header("x-file-name", file_name)
            .body(input.to_vec());
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| PipelineError::transient(format!("partition request failed: {e}")))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(PipelineError::transient(format!(
                "partition API returned {status}"
            )));
        }
        if !status.is_success() {
            return Err(PipelineError::engine(format!(
                "partition API rejected {file_name}: {status}"
            )));
        }

        // The response body is the element JSON; stored verbatim.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| PipelineError::transient(format!("partition body failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "partition-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converter_command_line_is_split() {
        let engine = MarkdownConvertEngine::new("pdf2md --tables --embed-images").unwrap();
        assert_eq!(engine.program, "pdf2md");
        assert_eq!(engine.args, vec!["--tables", "--embed-images"]);
    }

    #[test]
    fn empty_converter_command_is_rejected() {
        assert!(MarkdownConvertEngine::new("   ").is_err());
    }

    #[tokio::test]
    async fn converter_pipes_stdin_to_stdout() {
        let engine = MarkdownConvertEngine::new("cat").unwrap();
        let out = engine.extract("a.pdf", b"raw document").await.unwrap();
        assert_eq!(out, b"raw document");
    }

    #[tokio::test]
    async fn converter_failure_is_engine_error() {
        let engine = MarkdownConvertEngine::new("false").unwrap();
        let err = engine.extract("a.pdf", b"raw").await.unwrap_err();
        assert!(matches!(err, PipelineError::Engine { .. }));
        assert!(!err.is_retryable());
    }
}
