use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::notification::{notification_key, NotificationTokenData};
use crate::ports::notification_store::{NotificationStore, StoreError};

/// Process-local store, for development and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<String, NotificationTokenData>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn put(&self, record: &NotificationTokenData) -> Result<(), StoreError> {
        self.records.write().await.insert(record.key(), record.clone());
        Ok(())
    }

    async fn get(&self, miniapp_id: &str, fid: u64) -> Result<Option<NotificationTokenData>, StoreError> {
        Ok(self.records.read().await.get(&notification_key(miniapp_id, fid)).cloned())
    }

    async fn delete(&self, miniapp_id: &str, fid: u64) -> Result<(), StoreError> {
        self.records.write().await.remove(&notification_key(miniapp_id, fid));
        Ok(())
    }

    async fn list(&self, miniapp_id: &str) -> Result<Vec<NotificationTokenData>, StoreError> {
        let mut records: Vec<_> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.miniapp_id == miniapp_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.fid);
        Ok(records)
    }
}
