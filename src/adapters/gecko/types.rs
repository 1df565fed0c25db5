//! GeckoTerminal response types
//!
//! Only the fields used for token conversion and charts are modelled.
//! Pools are kept as raw JSON at the top level so one malformed pool does
//! not fail the whole page.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// `GET /{network}/pools` response
#[derive(Debug, Clone, Deserialize)]
pub struct PoolsResponse {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub included: Vec<IncludedItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeckoPool {
    pub id: String,
    pub attributes: PoolAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolAttributes {
    pub address: String,
    /// `"SYMBOL / QUOTE"`
    pub name: String,
    #[serde(default)]
    pub from_volume_in_usd: Option<String>,
    pub price_percent_changes: PricePercentChanges,
    pub base_token_id: String,
    pub token_value_data: HashMap<String, TokenValueData>,
    #[serde(default)]
    pub price_in_usd: Option<String>,
    #[serde(default)]
    pub reserve_in_usd: Option<String>,
    #[serde(default)]
    pub pool_created_at: Option<String>,
}

/// Signed percent strings such as `"+3.2%"`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricePercentChanges {
    #[serde(default)]
    pub last_1h: Option<String>,
    #[serde(default)]
    pub last_6h: Option<String>,
    #[serde(default)]
    pub last_24h: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenValueData {
    #[serde(default)]
    pub market_cap_in_usd: Option<f64>,
    #[serde(default)]
    pub fdv_in_usd: Option<f64>,
}

/// Entry of the `included` array: tokens, dexes and networks share it
#[derive(Debug, Clone, Deserialize)]
pub struct IncludedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: IncludedAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncludedAttributes {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// `GET /networks/{network}/tokens/{address}/pools` response
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPoolsResponse {
    #[serde(default)]
    pub data: Vec<TokenPool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPool {
    pub attributes: TokenPoolAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPoolAttributes {
    pub address: String,
}

/// `GET /networks/{network}/pools/{pool}/ohlcv/day` response
#[derive(Debug, Clone, Deserialize)]
pub struct OhlcvResponse {
    pub data: OhlcvData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OhlcvData {
    pub attributes: OhlcvAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OhlcvAttributes {
    /// `[timestamp, open, high, low, close, volume]`, newest first
    pub ohlcv_list: Vec<Vec<f64>>,
}
