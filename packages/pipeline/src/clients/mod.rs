//! HTTP clients for the pipeline's external collaborators.

pub mod catalog;
pub mod engines;
pub mod gateway;

pub use catalog::HfCatalogClient;
pub use engines::{MarkdownConvertEngine, PartitionApiClient};
pub use gateway::GatewayObjectStore;
