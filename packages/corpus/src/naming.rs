//! Per-engine output naming transforms.
//!
//! Each extraction engine writes its output under a name that is a
//! deterministic function of the input's natural file name, but not
//! necessarily the same name: the markdown converter swaps the source
//! extension for `.txt`, the partitioning service appends `.json`.
//! Reconciliation has to invert that transform to recover the natural
//! file name from a listed output key, so the transform is an explicit
//! injectable value with a unit-testable inverse, never inline string
//! surgery inside a stage.
//!
//! Invariant for every implementation:
//! `invert_output_name(derive_output_name(n)) == Some(n)` for any
//! in-scope input name `n`.

/// A naming transform and its inverse for one engine's namespace.
pub trait OutputNaming: Send + Sync {
    /// The output artifact name an engine produces for an input name.
    fn derive_output_name(&self, input_name: &str) -> String;

    /// Recover the natural file name from an output artifact name.
    /// Returns `None` for names this engine cannot have produced.
    fn invert_output_name(&self, output_name: &str) -> Option<String>;
}

/// Naming for the local markdown converter: the source extension is
/// replaced with `.txt` (`foo.bar.pdf` -> `foo.bar.txt`).
#[derive(Debug, Clone)]
pub struct MarkdownNaming {
    source_extension: String,
}

impl MarkdownNaming {
    /// `source_extension` without the leading dot, e.g. `pdf`.
    pub fn new(source_extension: impl Into<String>) -> Self {
        Self {
            source_extension: source_extension.into(),
        }
    }
}

impl OutputNaming for MarkdownNaming {
    fn derive_output_name(&self, input_name: &str) -> String {
        let stem = input_name
            .strip_suffix(&format!(".{}", self.source_extension))
            .unwrap_or(input_name);
        format!("{stem}.txt")
    }

    fn invert_output_name(&self, output_name: &str) -> Option<String> {
        let stem = output_name.strip_suffix(".txt")?;
        Some(format!("{stem}.{}", self.source_extension))
    }
}

/// Naming for the remote partitioning service: it keeps the full input
/// name and appends `.json` (`foo.pdf` -> `foo.pdf.json`).
#[derive(Debug, Clone, Default)]
pub struct PartitionNaming;

impl PartitionNaming {
    pub fn new() -> Self {
        Self
    }
}

impl OutputNaming for PartitionNaming {
    fn derive_output_name(&self, input_name: &str) -> String {
        format!("{input_name}.json")
    }

    fn invert_output_name(&self, output_name: &str) -> Option<String> {
        output_name.strip_suffix(".json").map(str::to_string)
    }
}
