//! Notification Service
//!
//! Applies verified mini-app lifecycle events to the token store and answers
//! status queries. Only the presence of a token is ever reported.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use crate::domain::notification::{MiniAppEvent, NotificationDetails, NotificationTokenData};
use crate::ports::notification_store::{NotificationStore, StoreError};
use crate::ports::webhook::{VerifyError, WebhookVerifier};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Verify(#[from] VerifyError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a webhook call changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Saved,
    Deleted,
    /// Valid event with nothing to store
    Ignored,
}

pub struct NotificationService {
    verifier: Arc<dyn WebhookVerifier>,
    store: Arc<dyn NotificationStore>,
    miniapp_id: String,
}

impl NotificationService {
    pub fn new(verifier: Arc<dyn WebhookVerifier>, store: Arc<dyn NotificationStore>, miniapp_id: impl Into<String>) -> Self {
        Self { verifier, store, miniapp_id: miniapp_id.into() }
    }

    pub fn miniapp_id(&self) -> &str {
        &self.miniapp_id
    }

    /// Verify a webhook body and apply its event
    pub async fn handle_webhook(&self, body: &Value) -> Result<WebhookOutcome, WebhookError> {
        let verified = self.verifier.parse_event(body).await?;
        let fid = verified.fid;
        tracing::info!("Verified {} event for fid {} (app fid {})", verified.event.name(), fid, verified.app_fid);

        let outcome = match verified.event {
            MiniAppEvent::MiniappAdded { notification_details: Some(details) }
            | MiniAppEvent::NotificationsEnabled { notification_details: details } => {
                self.save(fid, &details).await?;
                WebhookOutcome::Saved
            }
            MiniAppEvent::MiniappAdded { notification_details: None } => {
                tracing::info!("Fid {} added the mini-app without notifications", fid);
                WebhookOutcome::Ignored
            }
            MiniAppEvent::NotificationsDisabled | MiniAppEvent::MiniappRemoved => {
                self.store.delete(&self.miniapp_id, fid).await?;
                tracing::info!("Notification token removed for fid {}", fid);
                WebhookOutcome::Deleted
            }
            MiniAppEvent::Unknown => {
                tracing::warn!("Unknown webhook event for fid {}, ignoring", fid);
                WebhookOutcome::Ignored
            }
        };

        Ok(outcome)
    }

    async fn save(&self, fid: u64, details: &NotificationDetails) -> Result<(), StoreError> {
        let now = Utc::now();
        let record = match self.store.get(&self.miniapp_id, fid).await? {
            Some(existing) => existing.refreshed(details, now),
            None => NotificationTokenData::new(&self.miniapp_id, fid, details, now),
        };
        self.store.put(&record).await?;
        tracing::info!("Notification token saved for fid {}", fid);
        Ok(())
    }

    /// Whether a token is stored for `fid`
    pub async fn is_enabled(&self, fid: u64) -> Result<bool, StoreError> {
        Ok(self.store.get(&self.miniapp_id, fid).await?.is_some())
    }

    /// Every stored token of this mini-app, for delivery jobs
    pub async fn subscribers(&self) -> Result<Vec<NotificationTokenData>, StoreError> {
        self.store.list(&self.miniapp_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::MemoryStore;
    use crate::domain::notification::VerifiedEvent;
    use crate::ports::webhook::MockWebhookVerifier;
    use serde_json::json;

    fn details(token: &str) -> NotificationDetails {
        NotificationDetails { url: "https://api.host/notify".into(), token: token.into() }
    }

    fn service_with(events: Vec<MiniAppEvent>) -> (NotificationService, MemoryStore) {
        let mut verifier = MockWebhookVerifier::new();
        let mut queue = events.into_iter();
        verifier.expect_parse_event().returning(move |_| {
            let event = queue.next().unwrap_or(MiniAppEvent::Unknown);
            Ok(VerifiedEvent { fid: 77, app_fid: 1, event })
        });
        let store = MemoryStore::new();
        let service = NotificationService::new(Arc::new(verifier), Arc::new(store.clone()), "basebubbles");
        (service, store)
    }

    #[tokio::test]
    async fn test_enable_then_disable() {
        let (service, _store) = service_with(vec![
            MiniAppEvent::NotificationsEnabled { notification_details: details("t1") },
            MiniAppEvent::NotificationsDisabled,
        ]);

        assert_eq!(service.handle_webhook(&json!({})).await.unwrap(), WebhookOutcome::Saved);
        assert!(service.is_enabled(77).await.unwrap());

        assert_eq!(service.handle_webhook(&json!({})).await.unwrap(), WebhookOutcome::Deleted);
        assert!(!service.is_enabled(77).await.unwrap());
    }

    #[tokio::test]
    async fn test_added_with_and_without_details() {
        let (service, store) = service_with(vec![
            MiniAppEvent::MiniappAdded { notification_details: None },
            MiniAppEvent::MiniappAdded { notification_details: Some(details("t2")) },
        ]);

        assert_eq!(service.handle_webhook(&json!({})).await.unwrap(), WebhookOutcome::Ignored);
        assert_eq!(store.len().await, 0);

        assert_eq!(service.handle_webhook(&json!({})).await.unwrap(), WebhookOutcome::Saved);
        assert_eq!(service.subscribers().await.unwrap()[0].token, "t2");
    }

    #[tokio::test]
    async fn test_refresh_keeps_created_at() {
        let (service, store) = service_with(vec![
            MiniAppEvent::NotificationsEnabled { notification_details: details("old") },
            MiniAppEvent::NotificationsEnabled { notification_details: details("new") },
        ]);

        service.handle_webhook(&json!({})).await.unwrap();
        let first = store.get("basebubbles", 77).await.unwrap().unwrap();
        service.handle_webhook(&json!({})).await.unwrap();
        let second = store.get("basebubbles", 77).await.unwrap().unwrap();

        assert_eq!(second.token, "new");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
    }

    #[tokio::test]
    async fn test_removed_and_unknown() {
        let (service, store) = service_with(vec![
            MiniAppEvent::NotificationsEnabled { notification_details: details("t") },
            MiniAppEvent::Unknown,
            MiniAppEvent::MiniappRemoved,
        ]);

        service.handle_webhook(&json!({})).await.unwrap();
        assert_eq!(service.handle_webhook(&json!({})).await.unwrap(), WebhookOutcome::Ignored);
        assert_eq!(store.len().await, 1);
        assert_eq!(service.handle_webhook(&json!({})).await.unwrap(), WebhookOutcome::Deleted);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_verification_failure_writes_nothing() {
        let mut verifier = MockWebhookVerifier::new();
        verifier.expect_parse_event().returning(|_| Err(VerifyError::InvalidAppKey));
        let store = MemoryStore::new();
        let service = NotificationService::new(Arc::new(verifier), Arc::new(store.clone()), "basebubbles");

        let err = service.handle_webhook(&json!({})).await.unwrap_err();
        assert!(matches!(err, WebhookError::Verify(VerifyError::InvalidAppKey)));
        assert_eq!(store.len().await, 0);
    }
}
