use async_trait::async_trait;
use thiserror::Error;

use crate::domain::chart::ChartPoint;
use crate::domain::token::Token;

/// Default pool ordering on the aggregator
pub const DEFAULT_SORT: &str = "-24h_trend_score";

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("REST API error: {0}")]
    RestError(String),

    #[error("Upstream returned {status}")]
    Upstream { status: u16 },

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("No pools found for token {0}")]
    NoPools(String),
}

/// One page of the pool listing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenQuery {
    pub page: u32,
    pub sort: String,
}

impl Default for TokenQuery {
    fn default() -> Self {
        Self { page: 1, sort: DEFAULT_SORT.to_string() }
    }
}

/// Source of token listings and price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataPort: Send + Sync {
    /// Fetch one page of tokens, already flattened from pools
    async fn fetch_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>, MarketDataError>;

    /// Daily close prices for a token's top pool
    async fn fetch_chart(&self, address: &str, network: &str) -> Result<Vec<ChartPoint>, MarketDataError>;
}
