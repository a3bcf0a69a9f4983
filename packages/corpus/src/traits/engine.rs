//! Extraction engine contract.
//!
//! The two engines (a local markdown converter and a remote
//! partitioning service) are external systems; only this input/output
//! contract is part of the pipeline. An engine consumes one raw blob
//! and produces one derived text artifact. Where the output lands and
//! under what name is the driver's business, not the engine's - the
//! naming transforms live in [`crate::naming`].

use async_trait::async_trait;

use crate::error::Result;

/// One text-extraction method.
#[async_trait]
pub trait ExtractionEngine: Send + Sync {
    /// Produce the derived artifact for one raw file.
    ///
    /// `file_name` is the natural file name of the input, passed for
    /// logging and for engines that key behavior off the extension.
    /// Fails with `Engine` for per-document conversion failures and
    /// `TransientNetwork` when a remote engine is unreachable.
    async fn extract(&self, file_name: &str, input: &[u8]) -> Result<Vec<u8>>;

    /// Engine name for logging.
    fn name(&self) -> &str;
}
