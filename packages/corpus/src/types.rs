//! Domain types shared between the pipeline and its collaborators.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Which partition of the dataset a document came from.
///
/// Partitions are fetched and staged independently; the partition name
/// is also part of the remote path a raw file is downloaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePartition {
    Validation,
    Test,
}

impl SourcePartition {
    pub const ALL: [SourcePartition; 2] = [SourcePartition::Validation, SourcePartition::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourcePartition::Validation => "validation",
            SourcePartition::Test => "test",
        }
    }
}

impl std::fmt::Display for SourcePartition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourcePartition {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "validation" => Ok(SourcePartition::Validation),
            "test" => Ok(SourcePartition::Test),
            other => Err(PipelineError::schema_mismatch(format!(
                "unknown source partition: {other}"
            ))),
        }
    }
}

/// One catalog entry as yielded by the dataset source.
///
/// The partition is not part of the entry; the loader tags entries
/// with the partition it fetched them from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Opaque id assigned by the dataset source; never reused.
    pub task_id: String,
    pub question: String,
    pub level: String,
    pub final_answer: String,
    /// The file name as given by the source. Empty when the task has
    /// no attached file. Used as the cross-stage matching key.
    pub file_name: String,
    /// Opaque metadata blob, stored serialized and never interpreted.
    pub annotator_metadata: serde_json::Value,
}

impl CatalogEntry {
    /// Whether this entry's file carries the given extension
    /// (without the leading dot).
    ///
    /// Case-sensitive: the extraction drivers and naming transforms
    /// match keys case-sensitively, so admitting `report.PDF` here
    /// would stage a record no engine ever picks up.
    pub fn has_extension(&self, extension: &str) -> bool {
        !self.file_name.is_empty()
            && self
                .file_name
                .rsplit_once('.')
                .is_some_and(|(_, ext)| ext == extension)
    }
}
