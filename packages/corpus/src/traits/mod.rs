//! Trait abstractions for the pipeline's external collaborators.

pub mod catalog;
pub mod engine;
pub mod store;

pub use catalog::CatalogSource;
pub use engine::ExtractionEngine;
pub use store::ObjectStore;
