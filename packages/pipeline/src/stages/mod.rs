//! Pipeline stages.
//!
//! Each stage is one DAG node: idempotent, safe to re-run, and
//! independent per document. Per-document failures are logged and
//! skipped; only whole-node failures (the record store unreachable,
//! the catalog unavailable) propagate to the orchestrator.

pub mod driver;
pub mod loader;
pub mod reconciler;
pub mod stager;

pub use driver::{ExtractReport, ExtractionDriver};
pub use loader::{CatalogLoader, LoadReport};
pub use reconciler::{ReconcileReport, Reconciler};
pub use stager::{RawStager, StageReport};
