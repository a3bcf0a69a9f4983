//! Typed errors for the corpus pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can
//! match on the failure class. The orchestrator's retry decision and
//! the stages' skip-vs-abort decisions both key off these variants.

use thiserror::Error;

/// Errors that can occur across the pipeline's collaborators.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transient HTTP or connection failure; retryable at node level.
    #[error("transient network error: {message}")]
    TransientNetwork { message: String },

    /// The requested document or artifact does not exist.
    /// Stages skip the document and continue the batch.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The catalog payload did not match the expected shape.
    /// Aborts the whole load; the cohort is unusable.
    #[error("catalog schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// The canonical record store is unreachable.
    /// Aborts the current node; the orchestrator retries it.
    #[error("record store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// An output artifact key the naming transform cannot invert.
    #[error("cannot invert artifact name: {key}")]
    InvalidArtifactName { key: String },

    /// A derived file name matching more than one canonical record.
    /// The reconciler skips the artifact rather than updating an
    /// arbitrary row.
    #[error("file name {file_name} is ambiguous across {matches} records")]
    AmbiguousFileName { file_name: String, matches: usize },

    /// An extraction engine failed on one document.
    #[error("extraction engine error: {message}")]
    Engine { message: String },

    /// Missing or malformed configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Whether the orchestrator should retry the failed node.
    ///
    /// Only outages are worth retrying; a schema mismatch or a missing
    /// document will not fix itself within one run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PipelineError::TransientNetwork { .. } | PipelineError::StoreUnavailable { .. }
        )
    }

    pub fn transient(message: impl Into<String>) -> Self {
        PipelineError::TransientNetwork {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        PipelineError::NotFound { what: what.into() }
    }

    pub fn schema_mismatch(message: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            message: message.into(),
        }
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        PipelineError::StoreUnavailable {
            message: message.into(),
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        PipelineError::Engine {
            message: message.into(),
        }
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(PipelineError::transient("timeout").is_retryable());
        assert!(PipelineError::store_unavailable("connection refused").is_retryable());
        assert!(!PipelineError::not_found("foo.pdf").is_retryable());
        assert!(!PipelineError::schema_mismatch("missing column").is_retryable());
        assert!(!PipelineError::engine("converter exited 1").is_retryable());
        assert!(!PipelineError::AmbiguousFileName {
            file_name: "shared.pdf".into(),
            matches: 2,
        }
        .is_retryable());
    }
}
