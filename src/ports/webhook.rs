use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::notification::VerifiedEvent;

/// Failure while verifying a signed webhook body
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Envelope, header or signature malformed, or signature mismatch
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Signature fine but the payload is not a known event shape
    #[error("Invalid event data: {0}")]
    InvalidEventData(String),
    /// Key is not an active signer for the fid
    #[error("Invalid app key")]
    InvalidAppKey,
    /// Signer lookup itself failed
    #[error("App key verification failed: {0}")]
    VerifyAppKey(String),
}

/// Result of an app-key lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppKeyCheck {
    pub valid: bool,
    /// Fid owning the key when valid
    pub app_fid: Option<u64>,
}

/// Checks that an ed25519 key is a registered signer of a fid
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppKeyVerifier: Send + Sync {
    async fn verify_app_key(&self, fid: u64, app_key: &str) -> Result<AppKeyCheck, VerifyError>;
}

/// Turns a raw webhook body into a verified event
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WebhookVerifier: Send + Sync {
    async fn parse_event(&self, body: &Value) -> Result<VerifiedEvent, VerifyError>;
}
