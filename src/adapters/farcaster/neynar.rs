//! App-key lookup against a Farcaster hub (Neynar by default)

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use crate::adapters::retry::send_with_retry;
use crate::ports::webhook::{AppKeyCheck, AppKeyVerifier, VerifyError};

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub hub_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            hub_url: "https://hub-api.neynar.com".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            max_retries: 2,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SignersResponse {
    #[serde(default)]
    events: Vec<SignerEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignerEvent {
    signer_event_body: SignerEventBody,
}

#[derive(Debug, Deserialize)]
struct SignerEventBody {
    key: String,
    #[serde(default)]
    metadata: Option<String>,
}

/// Checks app keys through the hub's `onChainSignersByFid`
#[derive(Debug, Clone)]
pub struct HubKeyVerifier {
    config: HubConfig,
    http: Client,
}

impl HubKeyVerifier {
    pub fn new(config: HubConfig) -> Result<Self, VerifyError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VerifyError::VerifyAppKey(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, http })
    }

    /// Neynar hub with the given API key
    pub fn neynar(api_key: Option<String>) -> Result<Self, VerifyError> {
        Self::new(HubConfig { api_key, ..HubConfig::default() })
    }
}

/// `requestFid` from ABI-encoded `SignedKeyRequestMetadata`
/// (`tuple(uint256 requestFid, address, bytes, uint256)`), base64 encoded.
fn request_fid(metadata: &str) -> Option<u64> {
    let bytes = STANDARD.decode(metadata).ok()?;
    // Dynamic tuple: the first word is the offset of the tuple body
    let offset_word = bytes.get(0..32)?;
    if offset_word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let offset = usize::try_from(u64::from_be_bytes(offset_word[24..32].try_into().ok()?)).ok()?;
    let fid_word = bytes.get(offset..offset.checked_add(32)?)?;
    if fid_word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    Some(u64::from_be_bytes(fid_word[24..32].try_into().ok()?))
}

fn find_signer(response: &SignersResponse, app_key: &str) -> AppKeyCheck {
    let wanted = app_key.to_lowercase();
    match response
        .events
        .iter()
        .find(|e| e.signer_event_body.key.to_lowercase() == wanted)
    {
        Some(event) => AppKeyCheck {
            valid: true,
            app_fid: event.signer_event_body.metadata.as_deref().and_then(request_fid),
        },
        None => AppKeyCheck { valid: false, app_fid: None },
    }
}

#[async_trait]
impl AppKeyVerifier for HubKeyVerifier {
    async fn verify_app_key(&self, fid: u64, app_key: &str) -> Result<AppKeyCheck, VerifyError> {
        let url = format!("{}/v1/onChainSignersByFid", self.config.hub_url.trim_end_matches('/'));
        let mut request = self.http.get(&url).query(&[("fid", fid.to_string())]);
        if let Some(ref api_key) = self.config.api_key {
            request = request.header("x-api-key", api_key);
        }

        let response = send_with_retry(request, self.config.max_retries)
            .await
            .map_err(VerifyError::VerifyAppKey)?;

        if !response.status().is_success() {
            return Err(VerifyError::VerifyAppKey(format!("Hub returned {}", response.status())));
        }

        let body: SignersResponse = response
            .json()
            .await
            .map_err(|e| VerifyError::VerifyAppKey(format!("Unexpected hub response: {}", e)))?;

        let check = find_signer(&body, app_key);
        tracing::debug!("App key lookup for fid {}: valid={} app_fid={:?}", fid, check.valid, check.app_fid);
        Ok(check)
    }
}
