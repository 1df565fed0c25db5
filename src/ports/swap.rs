use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::domain::token::BASE_CHAIN_ID;

#[derive(Debug, Error)]
pub enum SwapError {
    /// Aggregator answered with a non-success status; `details` is its body
    #[error("Swap API returned {status}")]
    Upstream { status: u16, details: Value },
    #[error("API request failed: {0}")]
    ApiError(String),
}

/// Query parameters for price and quote requests.
///
/// Missing tokens or amounts are forwarded as empty strings and left for the
/// aggregator to reject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapParams {
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub buy_token: Option<String>,
    #[serde(default)]
    pub sell_token: Option<String>,
    #[serde(default)]
    pub sell_amount: Option<String>,
    #[serde(default)]
    pub taker: Option<String>,
}

impl SwapParams {
    pub fn new(buy_token: &str, sell_token: &str, sell_amount: &str) -> Self {
        Self {
            chain_id: None,
            buy_token: Some(buy_token.to_string()),
            sell_token: Some(sell_token.to_string()),
            sell_amount: Some(sell_amount.to_string()),
            taker: None,
        }
    }

    pub fn with_taker(mut self, taker: &str) -> Self {
        self.taker = Some(taker.to_string());
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id.unwrap_or(BASE_CHAIN_ID)
    }
}

/// Swap aggregator; responses are returned as raw JSON for proxying
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SwapPort: Send + Sync {
    /// Indicative price, no transaction data
    async fn get_price(&self, params: &SwapParams) -> Result<Value, SwapError>;

    /// Firm quote with transaction data
    async fn get_quote(&self, params: &SwapParams) -> Result<Value, SwapError>;
}
