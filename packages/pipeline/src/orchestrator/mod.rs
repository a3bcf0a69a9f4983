//! Pipeline orchestrator.
//!
//! Sequences the stages as a directed acyclic pipeline:
//!
//! ```text
//! Load ──► Stage ──┬─► ExtractMarkdown  ──► ReconcileMarkdown
//!                  └─► ExtractPartition ──► ReconcilePartition
//! ```
//!
//! Each node runs at most once per invocation, with a fixed number of
//! attempts and a fixed delay on retryable failures. A failed node
//! marks its downstream dependents skipped; the sibling branch still
//! runs. The two extraction branches are independent after staging
//! and run concurrently.
//!
//! Two runs racing on the same cohort is tolerated, not serialized:
//! every write along the pipeline is an idempotent single-row or
//! single-key upsert.

use std::sync::Arc;
use std::time::Duration;

use corpus::error::Result;
use corpus::naming::{MarkdownNaming, OutputNaming, PartitionNaming};
use corpus::traits::{catalog::CatalogSource, engine::ExtractionEngine, store::ObjectStore};
use corpus::types::SourcePartition;

use crate::config::PipelineConfig;
use crate::records::{RecordField, RecordStore};
use crate::stages::{CatalogLoader, ExtractionDriver, RawStager, Reconciler};

/// The DAG's nodes, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineNode {
    Load,
    Stage,
    ExtractMarkdown,
    ReconcileMarkdown,
    ExtractPartition,
    ReconcilePartition,
}

impl std::fmt::Display for PipelineNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineNode::Load => "load",
            PipelineNode::Stage => "stage",
            PipelineNode::ExtractMarkdown => "extract_markdown",
            PipelineNode::ReconcileMarkdown => "reconcile_markdown",
            PipelineNode::ExtractPartition => "extract_partition",
            PipelineNode::ReconcilePartition => "reconcile_partition",
        };
        f.write_str(name)
    }
}

/// Terminal state of one node in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Succeeded,
    /// Exhausted its attempts (or hit a non-retryable error).
    Failed,
    /// Not run because an upstream dependency failed.
    Skipped,
}

/// Per-node outcomes of one scheduled run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub load: NodeOutcome,
    pub stage: NodeOutcome,
    pub extract_markdown: NodeOutcome,
    pub reconcile_markdown: NodeOutcome,
    pub extract_partition: NodeOutcome,
    pub reconcile_partition: NodeOutcome,
}

impl RunReport {
    fn all_skipped() -> Self {
        Self {
            load: NodeOutcome::Skipped,
            stage: NodeOutcome::Skipped,
            extract_markdown: NodeOutcome::Skipped,
            reconcile_markdown: NodeOutcome::Skipped,
            extract_partition: NodeOutcome::Skipped,
            reconcile_partition: NodeOutcome::Skipped,
        }
    }

    /// Whether every node completed.
    pub fn succeeded(&self) -> bool {
        [
            self.load,
            self.stage,
            self.extract_markdown,
            self.reconcile_markdown,
            self.extract_partition,
            self.reconcile_partition,
        ]
        .iter()
        .all(|o| *o == NodeOutcome::Succeeded)
    }
}

/// External collaborators the orchestrator wires into the stages.
#[derive(Clone)]
pub struct PipelineDeps {
    pub catalog: Arc<dyn CatalogSource>,
    pub object_store: Arc<dyn ObjectStore>,
    pub records: Arc<dyn RecordStore>,
    pub markdown_engine: Arc<dyn ExtractionEngine>,
    pub partition_engine: Arc<dyn ExtractionEngine>,
}

/// Namespace and retry settings, usually derived from
/// [`PipelineConfig`].
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    pub staging_prefix: String,
    pub markdown_prefix: String,
    pub partition_prefix: String,
    pub supported_extension: String,
    /// Total attempts per node, including the first.
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl From<&PipelineConfig> for OrchestratorOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            staging_prefix: config.staging_prefix.clone(),
            markdown_prefix: config.markdown_prefix.clone(),
            partition_prefix: config.partition_prefix.clone(),
            supported_extension: config.supported_extension.clone(),
            retry_attempts: config.node_retry_attempts,
            retry_delay: config.node_retry_delay,
        }
    }
}

/// Runs the whole pipeline once per invocation.
pub struct Orchestrator {
    loader: CatalogLoader,
    stager: RawStager,
    markdown_driver: ExtractionDriver,
    markdown_reconciler: Reconciler,
    partition_driver: ExtractionDriver,
    partition_reconciler: Reconciler,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl Orchestrator {
    pub fn new(deps: PipelineDeps, options: OrchestratorOptions) -> Self {
        let markdown_naming: Arc<dyn OutputNaming> =
            Arc::new(MarkdownNaming::new(options.supported_extension.clone()));
        let partition_naming: Arc<dyn OutputNaming> = Arc::new(PartitionNaming::new());

        let loader = CatalogLoader::new(
            deps.catalog.clone(),
            deps.records.clone(),
            SourcePartition::ALL.to_vec(),
            options.supported_extension.clone(),
        );
        let stager = RawStager::new(
            deps.catalog.clone(),
            deps.object_store.clone(),
            deps.records.clone(),
            options.staging_prefix.clone(),
        );
        let markdown_driver = ExtractionDriver::new(
            deps.markdown_engine,
            markdown_naming.clone(),
            deps.object_store.clone(),
            options.staging_prefix.clone(),
            options.markdown_prefix.clone(),
            options.supported_extension.clone(),
        );
        let markdown_reconciler = Reconciler::new(
            deps.object_store.clone(),
            deps.records.clone(),
            markdown_naming,
            options.markdown_prefix,
            RecordField::MarkdownUrl,
        );
        let partition_driver = ExtractionDriver::new(
            deps.partition_engine,
            partition_naming.clone(),
            deps.object_store.clone(),
            options.staging_prefix,
            options.partition_prefix.clone(),
            options.supported_extension,
        );
        let partition_reconciler = Reconciler::new(
            deps.object_store,
            deps.records,
            partition_naming,
            options.partition_prefix,
            RecordField::PartitionUrl,
        );

        Self {
            loader,
            stager,
            markdown_driver,
            markdown_reconciler,
            partition_driver,
            partition_reconciler,
            retry_attempts: options.retry_attempts.max(1),
            retry_delay: options.retry_delay,
        }
    }

    /// Execute one run of the DAG.
    pub async fn run(&self) -> RunReport {
        tracing::info!("pipeline run starting");
        let mut report = RunReport::all_skipped();

        report.load = self.run_node(PipelineNode::Load, || self.loader.run()).await;
        if report.load != NodeOutcome::Succeeded {
            tracing::error!("load failed; skipping all downstream nodes");
            return report;
        }

        report.stage = self.run_node(PipelineNode::Stage, || self.stager.run()).await;
        if report.stage != NodeOutcome::Succeeded {
            tracing::error!("stage failed; skipping both extraction branches");
            return report;
        }

        // The branches are independent after staging; one failing
        // never halts the other.
        let (markdown, partition) = tokio::join!(
            self.run_branch(
                PipelineNode::ExtractMarkdown,
                &self.markdown_driver,
                PipelineNode::ReconcileMarkdown,
                &self.markdown_reconciler,
            ),
            self.run_branch(
                PipelineNode::ExtractPartition,
                &self.partition_driver,
                PipelineNode::ReconcilePartition,
                &self.partition_reconciler,
            ),
        );
        (report.extract_markdown, report.reconcile_markdown) = markdown;
        (report.extract_partition, report.reconcile_partition) = partition;

        tracing::info!(succeeded = report.succeeded(), ?report, "pipeline run finished");
        report
    }

    async fn run_branch(
        &self,
        extract_node: PipelineNode,
        driver: &ExtractionDriver,
        reconcile_node: PipelineNode,
        reconciler: &Reconciler,
    ) -> (NodeOutcome, NodeOutcome) {
        let extract = self.run_node(extract_node, || driver.run()).await;
        if extract != NodeOutcome::Succeeded {
            tracing::error!(node = %extract_node, "branch failed; skipping its reconciler");
            return (extract, NodeOutcome::Skipped);
        }
        let reconcile = self.run_node(reconcile_node, || reconciler.run()).await;
        (extract, reconcile)
    }

    async fn run_node<F, Fut, T>(&self, node: PipelineNode, mut op: F) -> NodeOutcome
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            tracing::info!(node = %node, attempt, "running node");
            match op().await {
                Ok(_) => return NodeOutcome::Succeeded,
                Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
                    tracing::warn!(
                        node = %node,
                        attempt,
                        error = %e,
                        delay_secs = self.retry_delay.as_secs(),
                        "node failed; retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(node = %node, attempt, error = %e, "node failed");
                    return NodeOutcome::Failed;
                }
            }
        }
    }
}
