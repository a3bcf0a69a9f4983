//! Dataset source contract.
//!
//! The catalog is a remote dataset that yields document metadata per
//! partition and raw file bytes per (partition, file name). There is
//! no ordering guarantee across calls, and any call may fail with a
//! transient HTTP error.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CatalogEntry, SourcePartition};

/// A remote catalog of benchmark documents.
///
/// Implementations:
/// - `HfCatalogClient` (pipeline package) - the hosted dataset API
/// - [`crate::testing::MockCatalogSource`] - in-memory fake for tests
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every catalog entry in one partition.
    ///
    /// Fails with `TransientNetwork` on connection trouble and
    /// `SchemaMismatch` when the payload cannot be decoded. Callers
    /// must treat any failure as "the cohort is incomplete" and not
    /// persist a partial catalog.
    async fn fetch_catalog(&self, partition: SourcePartition) -> Result<Vec<CatalogEntry>>;

    /// Fetch the raw bytes of one file.
    ///
    /// Fails with `NotFound` when the source has no such file and
    /// `TransientNetwork` on connection trouble.
    async fn fetch_bytes(&self, partition: SourcePartition, file_name: &str) -> Result<Vec<u8>>;

    /// Source name for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
