//! Bubble Service
//!
//! Fetches tokens for the bubble map and turns them into sized, placed
//! bubbles and a ready physics world.

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;

use crate::bubbles::{BubbleWorld, PhysicsConfig};
use crate::domain::chart::ChartPoint;
use crate::domain::layout::{compute_sizes, place_bubbles, LayoutBounds, SizingConfig};
use crate::domain::token::{SizeMetric, Token};
use crate::ports::market_data::{MarketDataError, MarketDataPort, TokenQuery};

#[derive(Debug, Clone)]
pub struct BubbleServiceConfig {
    pub max_bubbles: usize,
    pub sizing: SizingConfig,
    pub physics: PhysicsConfig,
}

impl Default for BubbleServiceConfig {
    fn default() -> Self {
        Self { max_bubbles: 50, sizing: SizingConfig::default(), physics: PhysicsConfig::default() }
    }
}

/// One bubble of an initial layout, as served to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaidOutBubble {
    pub token_id: String,
    pub symbol: String,
    pub image: String,
    pub size: f64,
    /// Center position
    pub x: f64,
    pub y: f64,
    /// Signed change for the window matching the metric
    pub change: Option<f64>,
    /// Held at the minimum size
    pub pinned: bool,
}

/// Initial layout for a token list
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleLayout {
    pub metric: SizeMetric,
    pub bounds: LayoutBounds,
    pub scale_factor: f64,
    pub bubbles: Vec<LaidOutBubble>,
}

pub struct BubbleService {
    market: Arc<dyn MarketDataPort>,
    config: BubbleServiceConfig,
}

impl BubbleService {
    pub fn new(market: Arc<dyn MarketDataPort>, config: BubbleServiceConfig) -> Self {
        Self { market, config }
    }

    pub fn config(&self) -> &BubbleServiceConfig {
        &self.config
    }

    /// One page of Base tokens
    pub async fn tokens(&self, query: &TokenQuery) -> Result<Vec<Token>, MarketDataError> {
        let mut tokens = self.market.fetch_tokens(query).await?;
        tokens.retain(Token::is_on_base);
        Ok(tokens)
    }

    /// Tokens shown as bubbles: first page, capped at `max_bubbles`
    pub async fn bubble_tokens(&self) -> Result<Vec<Token>, MarketDataError> {
        let mut tokens = self.tokens(&TokenQuery::default()).await?;
        tokens.truncate(self.config.max_bubbles);
        Ok(tokens)
    }

    pub async fn chart(&self, address: &str, network: &str) -> Result<Vec<ChartPoint>, MarketDataError> {
        self.market.fetch_chart(address, network).await
    }

    pub fn bounds(&self, width: f64, height: f64) -> LayoutBounds {
        LayoutBounds::for_viewport(width, height, &self.config.sizing)
    }

    /// Size and place `tokens` (capped at `max_bubbles`) in a viewport
    pub fn layout<R: Rng + ?Sized>(
        &self,
        tokens: &[Token],
        metric: SizeMetric,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> BubbleLayout {
        let tokens = &tokens[..tokens.len().min(self.config.max_bubbles)];
        let bounds = self.bounds(width, height);
        let plan = compute_sizes(tokens, metric, bounds);
        let placements = place_bubbles(&plan, rng);

        let bubbles = placements
            .iter()
            .zip(&plan.sizes)
            .map(|(p, s)| {
                let token = &tokens[p.index];
                LaidOutBubble {
                    token_id: token.id.clone(),
                    symbol: token.symbol.clone(),
                    image: token.image.clone(),
                    size: p.size,
                    x: p.x,
                    y: p.y,
                    change: token.signed_change(metric),
                    pinned: s.pinned,
                }
            })
            .collect();

        BubbleLayout { metric, bounds, scale_factor: plan.scale_factor, bubbles }
    }

    /// Physics world seeded from a fresh layout
    pub fn build_world<R: Rng + ?Sized>(
        &self,
        tokens: &[Token],
        metric: SizeMetric,
        width: f64,
        height: f64,
        rng: &mut R,
    ) -> BubbleWorld {
        let tokens = &tokens[..tokens.len().min(self.config.max_bubbles)];
        let bounds = self.bounds(width, height);
        let plan = compute_sizes(tokens, metric, bounds);
        let placements = place_bubbles(&plan, rng);
        BubbleWorld::new(&bounds, &placements, self.config.physics.clone(), rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::fixtures::token;
    use crate::ports::market_data::MockMarketDataPort;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn tokens(n: usize) -> Vec<Token> {
        (0..n).map(|i| token(&format!("T{}", i), Some(1_000.0 + i as f64 * 500.0), Some(i as f64))).collect()
    }

    #[tokio::test]
    async fn test_bubble_tokens_filters_chain_and_caps() {
        let mut list = tokens(60);
        list[0].chain = 1;

        let mut market = MockMarketDataPort::new();
        market
            .expect_fetch_tokens()
            .withf(|q| q.page == 1 && q.sort == "-24h_trend_score")
            .times(1)
            .returning(move |_| Ok(list.clone()));

        let service = BubbleService::new(Arc::new(market), BubbleServiceConfig::default());
        let bubbles = service.bubble_tokens().await.unwrap();

        assert_eq!(bubbles.len(), 50);
        assert!(bubbles.iter().all(|t| t.chain == 8453));
        assert_eq!(bubbles[0].symbol, "T1");
    }

    #[tokio::test]
    async fn test_upstream_error_propagates() {
        let mut market = MockMarketDataPort::new();
        market
            .expect_fetch_tokens()
            .returning(|_| Err(MarketDataError::Upstream { status: 503 }));

        let service = BubbleService::new(Arc::new(market), BubbleServiceConfig::default());
        assert!(matches!(service.bubble_tokens().await, Err(MarketDataError::Upstream { status: 503 })));
    }

    #[test]
    fn test_layout_matches_tokens() {
        let service = BubbleService::new(Arc::new(MockMarketDataPort::new()), BubbleServiceConfig::default());
        let list = tokens(12);
        let layout = service.layout(&list, SizeMetric::Change24h, 390.0, 844.0, &mut StdRng::seed_from_u64(1));

        assert_eq!(layout.bubbles.len(), 12);
        for (bubble, token) in layout.bubbles.iter().zip(&list) {
            assert_eq!(bubble.token_id, token.id);
            assert!(bubble.size >= layout.bounds.min_size && bubble.size <= layout.bounds.max_size);
        }
        // T0 has a 0% change, the smallest value, but is ranked, not pinned
        assert!(!layout.bubbles[0].pinned);
    }

    #[test]
    fn test_world_respects_cap() {
        let config = BubbleServiceConfig { max_bubbles: 5, ..BubbleServiceConfig::default() };
        let service = BubbleService::new(Arc::new(MockMarketDataPort::new()), config);
        let world = service.build_world(&tokens(9), SizeMetric::MarketCap, 390.0, 844.0, &mut StdRng::seed_from_u64(2));
        assert_eq!(world.len(), 5);
    }
}
