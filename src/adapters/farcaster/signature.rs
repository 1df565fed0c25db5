//! JSON Farcaster Signature verification
//!
//! Webhook bodies are envelopes `{header, payload, signature}`, each field
//! base64url encoded. The header names the user's fid and the ed25519 app
//! key that signed `"{header}.{payload}"`.

use std::sync::Arc;

use async_trait::async_trait;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::notification::{MiniAppEvent, VerifiedEvent};
use crate::ports::webhook::{AppKeyVerifier, VerifyError, WebhookVerifier};

/// base64url, padding optional on decode
pub const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encoded envelope as received
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureEnvelope {
    pub header: String,
    pub payload: String,
    pub signature: String,
}

/// Decoded header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureHeader {
    pub fid: u64,
    #[serde(rename = "type")]
    pub kind: String,
    /// 0x-prefixed hex ed25519 public key
    pub key: String,
}

fn invalid(msg: impl Into<String>) -> VerifyError {
    VerifyError::InvalidData(msg.into())
}

/// Parse the 32-byte public key from `0x…` hex
pub fn parse_app_key(key: &str) -> Result<VerifyingKey, VerifyError> {
    let bytes = hex::decode(key.trim_start_matches("0x")).map_err(|e| invalid(format!("Bad key hex: {}", e)))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|_| invalid("Key must be 32 bytes"))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| invalid(format!("Bad key: {}", e)))
}

impl SignatureEnvelope {
    pub fn from_json(body: &Value) -> Result<Self, VerifyError> {
        serde_json::from_value(body.clone()).map_err(|e| invalid(format!("Malformed envelope: {}", e)))
    }

    pub fn decode_header(&self) -> Result<SignatureHeader, VerifyError> {
        let raw = BASE64URL.decode(&self.header).map_err(|e| invalid(format!("Header encoding: {}", e)))?;
        serde_json::from_slice(&raw).map_err(|e| invalid(format!("Header JSON: {}", e)))
    }

    /// Check the ed25519 signature against the key named in the header
    pub fn verify_signature(&self, header: &SignatureHeader) -> Result<(), VerifyError> {
        let key = parse_app_key(&header.key)?;
        let sig_bytes = BASE64URL
            .decode(&self.signature)
            .map_err(|e| invalid(format!("Signature encoding: {}", e)))?;
        let signature = Signature::from_slice(&sig_bytes).map_err(|e| invalid(format!("Bad signature: {}", e)))?;

        let message = format!("{}.{}", self.header, self.payload);
        key.verify(message.as_bytes(), &signature)
            .map_err(|_| invalid("Signature does not match"))
    }

    pub fn decode_event(&self) -> Result<MiniAppEvent, VerifyError> {
        let raw = BASE64URL
            .decode(&self.payload)
            .map_err(|e| VerifyError::InvalidEventData(format!("Payload encoding: {}", e)))?;
        serde_json::from_slice(&raw).map_err(|e| VerifyError::InvalidEventData(e.to_string()))
    }
}

/// Verifies envelopes signed with app keys
#[derive(Clone)]
pub struct JsonSignatureVerifier {
    key_verifier: Arc<dyn AppKeyVerifier>,
}

impl JsonSignatureVerifier {
    pub fn new(key_verifier: Arc<dyn AppKeyVerifier>) -> Self {
        Self { key_verifier }
    }
}

#[async_trait]
impl WebhookVerifier for JsonSignatureVerifier {
    async fn parse_event(&self, body: &Value) -> Result<VerifiedEvent, VerifyError> {
        let envelope = SignatureEnvelope::from_json(body)?;
        let header = envelope.decode_header()?;

        if header.kind != "app_key" {
            return Err(invalid(format!("Unsupported signature type '{}'", header.kind)));
        }

        envelope.verify_signature(&header)?;

        let check = self.key_verifier.verify_app_key(header.fid, &header.key).await?;
        if !check.valid {
            tracing::warn!("App key {} is not a signer of fid {}", header.key, header.fid);
            return Err(VerifyError::InvalidAppKey);
        }

        let event = envelope.decode_event()?;

        Ok(VerifiedEvent { fid: header.fid, app_fid: check.app_fid.unwrap_or(header.fid), event })
    }
}
