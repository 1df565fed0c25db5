//! Token model
//!
//! Flat token view built from aggregator pool data, plus the sizing metric
//! selector shared by the bubble layout and the token table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base mainnet chain id
pub const BASE_CHAIN_ID: u64 = 8453;

/// Percent price change per time window; `None` when the upstream omits it
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceChange {
    #[serde(rename = "1h")]
    pub h1: Option<f64>,
    #[serde(rename = "6h")]
    pub h6: Option<f64>,
    #[serde(rename = "24h")]
    pub h24: Option<f64>,
}

/// A token as shown in the bubble map and token table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Pool id the token was sourced from
    pub id: String,
    /// Contract address
    pub address: String,
    pub chain: u64,
    pub name: String,
    pub symbol: String,
    /// USD price
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume_24h: Option<f64>,
    pub liquidity: Option<f64>,
    pub change: PriceChange,
    /// Icon URL, empty when unknown
    pub image: String,
    pub deployed_at: Option<String>,
}

impl Token {
    /// Raw magnitude of the selected metric.
    ///
    /// Percent changes use their absolute value. A market cap that is not
    /// strictly positive cannot be log-scaled and counts as missing.
    pub fn magnitude(&self, metric: SizeMetric) -> Option<f64> {
        match metric {
            SizeMetric::MarketCap => self.market_cap.filter(|v| v.is_finite() && *v > 0.0),
            SizeMetric::Change1h => self.change.h1.map(f64::abs),
            SizeMetric::Change6h => self.change.h6.map(f64::abs),
            SizeMetric::Change24h => self.change.h24.map(f64::abs),
        }
        .filter(|v| v.is_finite())
    }

    /// Signed change for the window matching `metric`, 24h for market cap
    pub fn signed_change(&self, metric: SizeMetric) -> Option<f64> {
        match metric {
            SizeMetric::Change1h => self.change.h1,
            SizeMetric::Change6h => self.change.h6,
            SizeMetric::MarketCap | SizeMetric::Change24h => self.change.h24,
        }
    }

    pub fn is_on_base(&self) -> bool {
        self.chain == BASE_CHAIN_ID
    }
}

/// Metric that drives bubble diameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeMetric {
    #[default]
    MarketCap,
    #[serde(rename = "1h")]
    Change1h,
    #[serde(rename = "6h")]
    Change6h,
    #[serde(rename = "24h")]
    Change24h,
}

impl SizeMetric {
    /// Market cap spans many orders of magnitude and is log-normalized
    pub fn is_logarithmic(self) -> bool {
        matches!(self, SizeMetric::MarketCap)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeMetric::MarketCap => "market_cap",
            SizeMetric::Change1h => "1h",
            SizeMetric::Change6h => "6h",
            SizeMetric::Change24h => "24h",
        }
    }
}

impl fmt::Display for SizeMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("Unknown metric '{0}', expected one of: market_cap, 1h, 6h, 24h")]
pub struct UnknownMetric(pub String);

impl FromStr for SizeMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market_cap" | "marketcap" | "mcap" => Ok(SizeMetric::MarketCap),
            "1h" => Ok(SizeMetric::Change1h),
            "6h" => Ok(SizeMetric::Change6h),
            "24h" => Ok(SizeMetric::Change24h),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// Column the token table can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSortKey {
    Symbol,
    Price,
    MarketCap,
    Volume,
    Change24h,
}

impl FromStr for TokenSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symbol" => Ok(Self::Symbol),
            "price" => Ok(Self::Price),
            "market_cap" | "mcap" => Ok(Self::MarketCap),
            "volume" => Ok(Self::Volume),
            "change" | "24h" => Ok(Self::Change24h),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

/// Sort tokens in place. Missing numeric values sort as zero.
pub fn sort_tokens(tokens: &mut [Token], key: TokenSortKey, descending: bool) {
    fn num(v: Option<f64>) -> f64 {
        v.unwrap_or(0.0)
    }

    tokens.sort_by(|a, b| {
        let ord = match key {
            TokenSortKey::Symbol => a.symbol.to_lowercase().cmp(&b.symbol.to_lowercase()),
            TokenSortKey::Price => num(a.price).total_cmp(&num(b.price)),
            TokenSortKey::MarketCap => num(a.market_cap).total_cmp(&num(b.market_cap)),
            TokenSortKey::Volume => num(a.volume_24h).total_cmp(&num(b.volume_24h)),
            TokenSortKey::Change24h => num(a.change.h24).total_cmp(&num(b.change.h24)),
        };
        if descending { ord.reverse() } else { ord }
    });
}
