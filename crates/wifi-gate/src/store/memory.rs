//! Process-lifetime in-memory store.
//!
//! Records are never evicted and are lost on restart.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use wifi_gate_common::VerificationRecord;

use super::VerificationStore;

/// HashMap-backed store
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, VerificationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl VerificationStore for MemoryStore {
    async fn get(&self, id: &str) -> Result<Option<VerificationRecord>> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, record: VerificationRecord) -> Result<()> {
        self.records.write().await.insert(id.to_string(), record);
        Ok(())
    }
}
