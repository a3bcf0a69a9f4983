//! Object store contract.
//!
//! A durable key/value blob store addressed by key within one bucket,
//! returning a stable content URL on write. Raw artifacts and both
//! engines' outputs all live here, under disjoint prefixes.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Blob storage for raw and derived artifacts.
///
/// Implementations:
/// - `GatewayObjectStore` (pipeline package) - HTTP storage gateway
/// - [`crate::stores::MemoryObjectStore`] - in-memory fake for tests
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a blob, overwriting any existing object at `key`.
    /// Returns the stable content URL, equal to [`Self::object_url`].
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<String>;

    /// List every key under a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Read a blob. Fails with `NotFound` for missing keys.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// The stable content URL for a key, without any round trip.
    ///
    /// Deterministic: `put` returns exactly this value, which is what
    /// lets the reconciler recompute URLs from listed keys alone.
    fn object_url(&self, key: &str) -> String;

    /// Mint a time-limited retrieval URL for downstream readers.
    async fn presigned_url(&self, key: &str, expires_in: Duration) -> Result<String>;
}
