//! Benchmark corpus metadata reconciliation pipeline.
//!
//! Takes a document from "known to exist" in a remote benchmark
//! catalog to "fully processed": catalog loaded into the canonical
//! record table, raw file staged into object storage, two extraction
//! engines run over it, and each engine's output reconciled back onto
//! the canonical record.
//!
//! # Modules
//!
//! - [`config`] - environment-driven configuration, read once in main
//! - [`records`] - canonical record model and store (Postgres + memory)
//! - [`clients`] - HTTP clients for the dataset source, the storage
//!   gateway, and the remote partition engine
//! - [`stages`] - loader, stager, extraction drivers, reconcilers
//! - [`orchestrator`] - the DAG that sequences the stages with
//!   node-level retry
//! - [`scheduler`] - cron trigger for scheduled runs

pub mod clients;
pub mod config;
pub mod orchestrator;
pub mod records;
pub mod scheduler;
pub mod stages;

pub use config::PipelineConfig;
pub use orchestrator::{NodeOutcome, Orchestrator, PipelineDeps, RunReport};
pub use records::{CanonicalRecord, RecordField, RecordStore};
