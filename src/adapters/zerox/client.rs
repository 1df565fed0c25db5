//! 0x Swap API Client
//!
//! Allowance-holder price and quote endpoints. Every request carries the
//! app's integrator fee.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::adapters::retry::send_with_retry;
use crate::ports::swap::{SwapError, SwapParams, SwapPort};

/// Address receiving the integrator fee
pub const SWAP_FEE_RECIPIENT: &str = "0x467051A5c4BD354fC0ca9fC1ed11Bf7F8F035730";

/// Integrator fee in basis points
pub const SWAP_FEE_BPS: u16 = 15;

/// 0x client configuration
#[derive(Debug, Clone)]
pub struct ZeroXConfig {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub fee_recipient: String,
    pub fee_bps: u16,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for ZeroXConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.0x.org/swap/allowance-holder".to_string(),
            api_key: None,
            fee_recipient: SWAP_FEE_RECIPIENT.to_string(),
            fee_bps: SWAP_FEE_BPS,
            timeout: Duration::from_secs(20),
            max_retries: 3,
        }
    }
}

/// 0x swap aggregator client
#[derive(Debug, Clone)]
pub struct ZeroXClient {
    config: ZeroXConfig,
    http: Client,
}

impl ZeroXClient {
    pub fn new() -> Result<Self, SwapError> {
        Self::with_config(ZeroXConfig::default())
    }

    pub fn with_config(config: ZeroXConfig) -> Result<Self, SwapError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SwapError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            tracing::warn!("No 0x API key configured, requests will likely be rejected");
        }

        Ok(Self { config, http })
    }

    pub fn with_api_key(api_key: String) -> Result<Self, SwapError> {
        let mut config = ZeroXConfig::default();
        config.api_key = Some(api_key);
        Self::with_config(config)
    }

    /// Query string sent upstream, fee parameters included
    pub fn query_pairs(&self, params: &SwapParams) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("chainId", params.chain_id().to_string()),
            ("buyToken", params.buy_token.clone().unwrap_or_default()),
            ("sellToken", params.sell_token.clone().unwrap_or_default()),
            ("sellAmount", params.sell_amount.clone().unwrap_or_default()),
            ("swapFeeRecipient", self.config.fee_recipient.clone()),
            ("swapFeeBps", self.config.fee_bps.to_string()),
        ];
        if let Some(taker) = params.taker.as_ref().filter(|t| !t.is_empty()) {
            pairs.push(("taker", taker.clone()));
        }
        pairs
    }

    async fn request(&self, endpoint: &str, params: &SwapParams) -> Result<Value, SwapError> {
        let url = format!("{}/{}", self.config.api_base_url, endpoint);
        let request = self
            .http
            .get(&url)
            .header("0x-api-key", self.config.api_key.as_deref().unwrap_or_default())
            .header("0x-version", "v2")
            .query(&self.query_pairs(params));

        let response = send_with_retry(request, self.config.max_retries)
            .await
            .map_err(SwapError::ApiError)?;

        let status = response.status();
        if !status.is_success() {
            let details = response.json::<Value>().await.unwrap_or_else(|_| Value::Object(Default::default()));
            tracing::error!("0x API error on /{}: {} {}", endpoint, status, details);
            return Err(SwapError::Upstream { status: status.as_u16(), details });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SwapError::ApiError(format!("Invalid JSON from 0x: {}", e)))
    }
}

#[async_trait]
impl SwapPort for ZeroXClient {
    async fn get_price(&self, params: &SwapParams) -> Result<Value, SwapError> {
        tracing::debug!("Price request: {:?}", params);
        self.request("price", params).await
    }

    async fn get_quote(&self, params: &SwapParams) -> Result<Value, SwapError> {
        tracing::debug!("Quote request: {:?}", params);
        self.request("quote", params).await
    }
}
