use async_trait::async_trait;
use thiserror::Error;

use crate::domain::notification::NotificationTokenData;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Backend(String),
    #[error("Corrupt record under {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Key-value storage for push-notification tokens
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert or overwrite the record under its (miniapp, fid) key
    async fn put(&self, record: &NotificationTokenData) -> Result<(), StoreError>;

    async fn get(&self, miniapp_id: &str, fid: u64) -> Result<Option<NotificationTokenData>, StoreError>;

    /// Remove the record; removing a missing record is not an error
    async fn delete(&self, miniapp_id: &str, fid: u64) -> Result<(), StoreError>;

    /// Every record of one mini-app
    async fn list(&self, miniapp_id: &str) -> Result<Vec<NotificationTokenData>, StoreError>;
}
