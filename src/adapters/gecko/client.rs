//! GeckoTerminal API Client
//!
//! Pool listings come from the app endpoint (richer `include`s), price
//! history from the public v2 API. Pool pages are cached per (page, sort).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::convert::response_to_tokens;
use super::types::{OhlcvResponse, PoolsResponse, TokenPoolsResponse};
use crate::domain::chart::{ohlcv_to_chart, ChartPoint};
use crate::domain::token::Token;
use crate::ports::market_data::{MarketDataError, MarketDataPort, TokenQuery};
use crate::adapters::retry::send_with_retry;

/// GeckoTerminal client configuration
#[derive(Debug, Clone)]
pub struct GeckoConfig {
    /// App API used for the pools listing
    pub pools_url: String,
    /// Public v2 API used for token pools and OHLCV
    pub api_url: String,
    pub network: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub cache_ttl: Duration,
    /// Candles requested for the chart
    pub ohlcv_limit: u32,
}

impl Default for GeckoConfig {
    fn default() -> Self {
        Self {
            pools_url: "https://app.geckoterminal.com/api/p1".to_string(),
            api_url: "https://api.geckoterminal.com/api/v2".to_string(),
            network: "base".to_string(),
            user_agent: "Mozilla/5.0 (compatible; FarBubbles/1.0)".to_string(),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            cache_ttl: Duration::from_secs(60),
            ohlcv_limit: 60,
        }
    }
}

/// GeckoTerminal market data client
#[derive(Debug, Clone)]
pub struct GeckoClient {
    config: GeckoConfig,
    http: Client,
    cache: Arc<Mutex<HashMap<TokenQuery, (Instant, Vec<Token>)>>>,
}

impl GeckoClient {
    pub fn new() -> Result<Self, MarketDataError> {
        Self::with_config(GeckoConfig::default())
    }

    pub fn with_config(config: GeckoConfig) -> Result<Self, MarketDataError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MarketDataError::RestError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http, cache: Arc::new(Mutex::new(HashMap::new())) })
    }

    pub fn config(&self) -> &GeckoConfig {
        &self.config
    }

    /// URL of the pools listing for the configured network
    pub fn pools_endpoint(&self) -> String {
        format!("{}/{}/pools", self.config.pools_url, self.config.network)
    }

    /// Fetch and convert one page of pools, bypassing the cache
    pub async fn fetch_pools(&self, query: &TokenQuery) -> Result<Vec<Token>, MarketDataError> {
        let page = query.page.to_string();
        let request = self
            .http
            .get(self.pools_endpoint())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.config.user_agent)
            .query(&[
                ("include", "dex,dex.network,dex.network.network_metric,tokens"),
                ("page", page.as_str()),
                ("include_network_metrics", "true"),
                ("include_meta", "1"),
                ("sort", query.sort.as_str()),
                ("networks", self.config.network.as_str()),
            ]);

        tracing::debug!("Fetching pools page {} sorted by {}", query.page, query.sort);
        let response: PoolsResponse = self.get_json(request).await?;
        Ok(response_to_tokens(&response))
    }

    /// Drop every cached page
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    async fn get_json<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, MarketDataError> {
        let response = send_with_retry(request, self.config.max_retries)
            .await
            .map_err(MarketDataError::RestError)?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("GeckoTerminal API error: {}", status);
            return Err(MarketDataError::Upstream { status: status.as_u16() });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MarketDataError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl MarketDataPort for GeckoClient {
    async fn fetch_tokens(&self, query: &TokenQuery) -> Result<Vec<Token>, MarketDataError> {
        {
            let cache = self.cache.lock().await;
            if let Some((fetched_at, tokens)) = cache.get(query) {
                if fetched_at.elapsed() < self.config.cache_ttl {
                    tracing::debug!("Using cached pools page {} ({} tokens)", query.page, tokens.len());
                    return Ok(tokens.clone());
                }
            }
        }

        let tokens = self.fetch_pools(query).await?;
        tracing::info!("Fetched {} tokens from GeckoTerminal (page {})", tokens.len(), query.page);

        let mut cache = self.cache.lock().await;
        cache.retain(|_, (fetched_at, _)| fetched_at.elapsed() < self.config.cache_ttl);
        cache.insert(query.clone(), (Instant::now(), tokens.clone()));

        Ok(tokens)
    }

    async fn fetch_chart(&self, address: &str, network: &str) -> Result<Vec<ChartPoint>, MarketDataError> {
        let pools_url = format!("{}/networks/{}/tokens/{}/pools", self.config.api_url, network, address);
        let pools: TokenPoolsResponse = self
            .get_json(self.http.get(&pools_url).header(ACCEPT, "application/json"))
            .await?;

        let top_pool = pools
            .data
            .first()
            .ok_or_else(|| MarketDataError::NoPools(address.to_string()))?;

        let ohlcv_url = format!(
            "{}/networks/{}/pools/{}/ohlcv/day",
            self.config.api_url, network, top_pool.attributes.address
        );
        let limit = self.config.ohlcv_limit.to_string();
        let ohlcv: OhlcvResponse = self
            .get_json(
                self.http
                    .get(&ohlcv_url)
                    .header(ACCEPT, "application/json")
                    .query(&[("limit", limit.as_str())]),
            )
            .await?;

        let chart = ohlcv_to_chart(&ohlcv.data.attributes.ohlcv_list);
        tracing::debug!("Chart for {} via pool {}: {} points", address, top_pool.attributes.address, chart.len());
        Ok(chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeckoConfig::default();
        assert_eq!(config.network, "base");
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert!(config.user_agent.contains("FarBubbles"));
    }

    #[test]
    fn test_pools_endpoint() {
        let client = GeckoClient::new().unwrap();
        assert_eq!(client.pools_endpoint(), "https://app.geckoterminal.com/api/p1/base/pools");
    }

    #[tokio::test]
    async fn test_fresh_cache_is_served_without_network() {
        let client = GeckoClient::with_config(GeckoConfig {
            pools_url: "http://127.0.0.1:1".to_string(),
            max_retries: 1,
            ..GeckoConfig::default()
        })
        .unwrap();

        let query = TokenQuery::default();
        let cached = vec![crate::domain::token::fixtures::token("CACHED", Some(1.0), None)];
        client.cache.lock().await.insert(query.clone(), (Instant::now(), cached.clone()));

        assert_eq!(client.fetch_tokens(&query).await.unwrap(), cached);

        // A different page misses the cache and hits the unreachable host
        let other = TokenQuery { page: 2, ..TokenQuery::default() };
        assert!(matches!(client.fetch_tokens(&other).await, Err(MarketDataError::RestError(_))));

        client.clear_cache().await;
        assert!(client.cache.lock().await.is_empty());
    }
}
