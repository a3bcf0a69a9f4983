//! Extraction driver.
//!
//! Generic adapter between the staging namespace and one extraction
//! engine: scan staged raw artifacts, skip inputs whose output already
//! exists, run the engine, and write the derived artifact under the
//! engine's exclusive namespace using its naming transform. The driver
//! only ever sees staged artifacts, which is what upholds the
//! invariant that a document with no raw artifact can never acquire an
//! extraction URL.

use std::collections::HashSet;
use std::sync::Arc;

use corpus::error::Result;
use corpus::naming::OutputNaming;
use corpus::traits::{engine::ExtractionEngine, store::ObjectStore};

/// Outcome of one driver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractReport {
    pub extracted: usize,
    /// Inputs whose output artifact already existed.
    pub already_present: usize,
    pub skipped: usize,
}

/// Runs one extraction engine over the staging namespace.
pub struct ExtractionDriver {
    engine: Arc<dyn ExtractionEngine>,
    naming: Arc<dyn OutputNaming>,
    store: Arc<dyn ObjectStore>,
    input_prefix: String,
    output_prefix: String,
    supported_extension: String,
}

impl ExtractionDriver {
    pub fn new(
        engine: Arc<dyn ExtractionEngine>,
        naming: Arc<dyn OutputNaming>,
        store: Arc<dyn ObjectStore>,
        input_prefix: impl Into<String>,
        output_prefix: impl Into<String>,
        supported_extension: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            naming,
            store,
            input_prefix: input_prefix.into(),
            output_prefix: output_prefix.into(),
            supported_extension: supported_extension.into(),
        }
    }

    pub async fn run(&self) -> Result<ExtractReport> {
        let existing: HashSet<String> =
            self.store.list(&self.output_prefix).await?.into_iter().collect();
        let inputs = self.store.list(&self.input_prefix).await?;

        let suffix = format!(".{}", self.supported_extension);
        let mut report = ExtractReport {
            extracted: 0,
            already_present: 0,
            skipped: 0,
        };

        for key in inputs {
            if !key.ends_with(&suffix) {
                continue;
            }
            let file_name = final_segment(&key);
            let output_key = format!(
                "{}{}",
                self.output_prefix,
                self.naming.derive_output_name(file_name)
            );
            if existing.contains(&output_key) {
                report.already_present += 1;
                continue;
            }

            match self.extract_one(&key, file_name, &output_key).await {
                Ok(()) => report.extracted += 1,
                Err(e) => {
                    tracing::warn!(
                        engine = self.engine.name(),
                        key = %key,
                        error = %e,
                        "skipping input"
                    );
                    report.skipped += 1;
                }
            }
        }

        tracing::info!(
            engine = self.engine.name(),
            extracted = report.extracted,
            already_present = report.already_present,
            skipped = report.skipped,
            "extraction complete"
        );
        Ok(report)
    }

    async fn extract_one(&self, key: &str, file_name: &str, output_key: &str) -> Result<()> {
        let input = self.store.get(key).await?;
        let output = self.engine.extract(file_name, &input).await?;
        self.store.put(output_key, &output).await?;
        tracing::debug!(engine = self.engine.name(), output_key, "wrote derived artifact");
        Ok(())
    }
}

/// Path segment after the last `/`.
fn final_segment(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
