//! Upstash Redis over its REST API
//!
//! Each command is POSTed as a JSON array (`["SET", key, value]`) with a
//! bearer token; records are stored as JSON strings.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::adapters::retry::send_with_retry;
use crate::domain::notification::{notification_key, notification_key_pattern, NotificationTokenData};
use crate::ports::notification_store::{NotificationStore, StoreError};

#[derive(Debug, Clone)]
pub struct UpstashConfig {
    /// REST endpoint, e.g. `https://eu1-xxx.upstash.io`
    pub url: String,
    pub token: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl UpstashConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self { url: url.into(), token: token.into(), timeout: Duration::from_secs(10), max_retries: 3 }
    }
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpstashStore {
    config: UpstashConfig,
    http: Client,
}

impl UpstashStore {
    pub fn new(config: UpstashConfig) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Backend(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    async fn command(&self, args: Value) -> Result<Value, StoreError> {
        let request = self
            .http
            .post(self.config.url.trim_end_matches('/'))
            .bearer_auth(&self.config.token)
            .json(&args);

        let response = send_with_retry(request, self.config.max_retries)
            .await
            .map_err(StoreError::Backend)?;
        let status = response.status();

        let body: CommandResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Backend(format!("Invalid response ({}): {}", status, e)))?;

        match body.error {
            Some(error) => Err(StoreError::Backend(error)),
            None if !status.is_success() => Err(StoreError::Backend(format!("Upstash returned {}", status))),
            None => Ok(body.result),
        }
    }
}

/// Decode a stored value; `null` means no record
fn decode_record(key: &str, value: Value) -> Result<Option<NotificationTokenData>, StoreError> {
    let corrupt = |e: serde_json::Error| StoreError::Corrupt { key: key.to_string(), reason: e.to_string() };
    match value {
        Value::Null => Ok(None),
        Value::String(raw) => serde_json::from_str(&raw).map(Some).map_err(corrupt),
        other => serde_json::from_value(other).map(Some).map_err(corrupt),
    }
}

#[async_trait]
impl NotificationStore for UpstashStore {
    async fn put(&self, record: &NotificationTokenData) -> Result<(), StoreError> {
        let value = serde_json::to_string(record).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.command(json!(["SET", record.key(), value])).await?;
        Ok(())
    }

    async fn get(&self, miniapp_id: &str, fid: u64) -> Result<Option<NotificationTokenData>, StoreError> {
        let key = notification_key(miniapp_id, fid);
        let value = self.command(json!(["GET", key])).await?;
        decode_record(&key, value)
    }

    async fn delete(&self, miniapp_id: &str, fid: u64) -> Result<(), StoreError> {
        self.command(json!(["DEL", notification_key(miniapp_id, fid)])).await?;
        Ok(())
    }

    async fn list(&self, miniapp_id: &str) -> Result<Vec<NotificationTokenData>, StoreError> {
        let keys: Vec<String> = serde_json::from_value(
            self.command(json!(["KEYS", notification_key_pattern(miniapp_id)])).await?,
        )
        .map_err(|e| StoreError::Backend(format!("Unexpected KEYS result: {}", e)))?;

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut args = vec![Value::from("MGET")];
        args.extend(keys.iter().cloned().map(Value::from));
        let values: Vec<Value> = serde_json::from_value(self.command(Value::Array(args)).await?)
            .map_err(|e| StoreError::Backend(format!("Unexpected MGET result: {}", e)))?;

        let mut records = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            match decode_record(key, value) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => tracing::warn!("Skipping record: {}", e),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::notification::NotificationDetails;
    use chrono::Utc;

    #[test]
    fn test_decode_record_variants() {
        let details = NotificationDetails { url: "https://n".into(), token: "t".into() };
        let record = NotificationTokenData::new("app", 5, &details, Utc::now());
        let encoded = serde_json::to_string(&record).unwrap();

        assert_eq!(decode_record("k", Value::String(encoded)).unwrap(), Some(record.clone()));
        assert_eq!(decode_record("k", serde_json::to_value(&record).unwrap()).unwrap(), Some(record));
        assert_eq!(decode_record("k", Value::Null).unwrap(), None);
        assert!(matches!(
            decode_record("k", Value::String("not json".into())),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let mut config = UpstashConfig::new("http://127.0.0.1:1", "token");
        config.max_retries = 1;
        let store = UpstashStore::new(config).unwrap();

        assert!(matches!(store.get("app", 1).await, Err(StoreError::Backend(_))));
    }
}
