//! Verification record storage.
//!
//! The engine only sees the [`VerificationStore`] trait, so a durable
//! backend can replace [`MemoryStore`] without touching verification logic.

mod memory;

pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;
use wifi_gate_common::VerificationRecord;

/// Keyed storage for verification records
#[async_trait]
pub trait VerificationStore: Send + Sync {
    /// Fetch the record stored under `id`
    async fn get(&self, id: &str) -> Result<Option<VerificationRecord>>;

    /// Insert or overwrite the record stored under `id`
    async fn put(&self, id: &str, record: VerificationRecord) -> Result<()>;
}
