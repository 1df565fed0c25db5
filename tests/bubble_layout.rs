//! Bubble Layout Integration Tests
//!
//! Token list -> BubbleService layout -> rapier world -> animator frames,
//! with a stubbed market data port. Deterministic seeds throughout.

use std::sync::Arc;

use approx::assert_relative_eq;
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;

use base_bubbles::application::{BubbleService, BubbleServiceConfig, BubbleSession};
use base_bubbles::bubbles::LatestFrame;
use base_bubbles::domain::chart::ChartPoint;
use base_bubbles::domain::token::{PriceChange, SizeMetric, Token, BASE_CHAIN_ID};
use base_bubbles::ports::market_data::{MarketDataError, MarketDataPort, TokenQuery};

// ============================================================================
// Test Fixtures
// ============================================================================

fn token(i: usize, market_cap: Option<f64>, change: Option<f64>, chain: u64) -> Token {
    Token {
        id: format!("base_0x{:040x}", i),
        address: format!("0x{:040x}", i),
        chain,
        name: format!("Token {}", i),
        symbol: format!("TK{}", i),
        price: Some(0.01 * (i + 1) as f64),
        market_cap,
        volume_24h: Some(1_000.0 * i as f64),
        liquidity: Some(50_000.0),
        change: PriceChange { h1: change.map(|c| c / 4.0), h6: change.map(|c| c / 2.0), h24: change },
        image: String::new(),
        deployed_at: None,
    }
}

/// Mixed list: spread of market caps, some negative changes, one missing cap
fn trending(n: usize) -> Vec<Token> {
    (0..n)
        .map(|i| {
            let cap = if i == 3 { None } else { Some(10f64.powf(4.0 + (i % 6) as f64) * (1.0 + i as f64 / 10.0)) };
            let change = Some(if i % 2 == 0 { i as f64 * 1.7 } else { -(i as f64) * 2.3 });
            token(i, cap, change, BASE_CHAIN_ID)
        })
        .collect()
}

struct FixedMarket {
    tokens: Vec<Token>,
}

#[async_trait]
impl MarketDataPort for FixedMarket {
    async fn fetch_tokens(&self, _query: &TokenQuery) -> Result<Vec<Token>, MarketDataError> {
        Ok(self.tokens.clone())
    }

    async fn fetch_chart(&self, address: &str, _network: &str) -> Result<Vec<ChartPoint>, MarketDataError> {
        Err(MarketDataError::NoPools(address.to_string()))
    }
}

fn service(tokens: Vec<Token>) -> Arc<BubbleService> {
    Arc::new(BubbleService::new(Arc::new(FixedMarket { tokens }), BubbleServiceConfig::default()))
}

// ============================================================================
// Layout
// ============================================================================

#[tokio::test]
async fn test_layout_filters_foreign_chains_and_caps_count() {
    let mut tokens = trending(60);
    tokens[0].chain = 1;
    let service = service(tokens);

    let listed = service.bubble_tokens().await.unwrap();
    assert_eq!(listed.len(), 50);
    assert!(listed.iter().all(|t| t.chain == BASE_CHAIN_ID));
    assert_ne!(listed[0].symbol, "TK0");
}

#[tokio::test]
async fn test_layout_sizes_within_bounds_for_every_metric() {
    let service = service(trending(50));
    let tokens = service.bubble_tokens().await.unwrap();

    for metric in [SizeMetric::MarketCap, SizeMetric::Change1h, SizeMetric::Change6h, SizeMetric::Change24h] {
        let layout = service.layout(&tokens, metric, 390.0, 844.0, &mut StdRng::seed_from_u64(5));
        let b = layout.bounds;

        assert_eq!(layout.bubbles.len(), tokens.len());
        for bubble in &layout.bubbles {
            assert!(bubble.size >= b.min_size - 1e-9 && bubble.size <= b.max_size + 1e-9, "{:?}", bubble);
        }
    }
}

#[tokio::test]
async fn test_missing_market_cap_is_pinned_to_min() {
    let service = service(trending(20));
    let tokens = service.bubble_tokens().await.unwrap();

    let layout = service.layout(&tokens, SizeMetric::MarketCap, 390.0, 844.0, &mut StdRng::seed_from_u64(1));
    let missing = layout.bubbles.iter().find(|b| b.symbol == "TK3").unwrap();

    assert!(missing.pinned);
    assert_relative_eq!(missing.size, layout.bounds.min_size);
}

#[tokio::test]
async fn test_change_metric_reports_signed_change() {
    let service = service(trending(10));
    let tokens = service.bubble_tokens().await.unwrap();

    let layout = service.layout(&tokens, SizeMetric::Change24h, 390.0, 844.0, &mut StdRng::seed_from_u64(1));
    let negative = layout.bubbles.iter().find(|b| b.symbol == "TK1").unwrap();
    assert_relative_eq!(negative.change.unwrap(), -2.3);

    let json = serde_json::to_value(&layout).unwrap();
    assert_eq!(json["metric"], "24h");
    assert!(json["bubbles"][0].get("tokenId").is_some());
}

#[tokio::test]
async fn test_equal_changes_all_min_size() {
    let tokens: Vec<Token> = (0..12).map(|i| token(i, Some(1e6), Some(3.0), BASE_CHAIN_ID)).collect();
    let service = service(tokens.clone());

    let layout = service.layout(&tokens, SizeMetric::Change24h, 800.0, 600.0, &mut StdRng::seed_from_u64(2));
    assert!(layout.bubbles.iter().all(|b| b.pinned && b.size == layout.bounds.min_size));
}

// ============================================================================
// Physics
// ============================================================================

#[tokio::test]
async fn test_bubbles_stay_inside_walls() {
    let service = service(trending(50));
    let tokens = service.bubble_tokens().await.unwrap();

    let mut session = BubbleSession::new(Arc::clone(&service), 390.0, 844.0, SizeMetric::MarketCap).with_seed(11);
    session.rebuild(&tokens, SizeMetric::MarketCap);

    let mut sink = LatestFrame::default();
    for _ in 0..600 {
        session.tick(&mut sink);
    }

    assert_eq!(sink.writes, 600);
    assert_eq!(sink.frames.len(), 50);
    for frame in &sink.frames {
        let (cx, cy) = frame.center();
        assert!(cx.is_finite() && cy.is_finite());
        assert!((-1.0..=391.0).contains(&cx), "x out of bounds: {:?}", frame);
        assert!((-1.0..=845.0).contains(&cy), "y out of bounds: {:?}", frame);
    }
}

#[tokio::test]
async fn test_paused_session_freezes_positions() {
    let service = service(trending(8));
    let tokens = service.bubble_tokens().await.unwrap();

    let mut session = BubbleSession::new(service, 390.0, 844.0, SizeMetric::Change24h).with_seed(4);
    session.rebuild(&tokens, SizeMetric::Change24h);

    let mut sink = LatestFrame::default();
    for _ in 0..10 {
        session.tick(&mut sink);
    }

    session.pause_handle().pause();
    session.tick(&mut sink);
    let frozen = sink.frames.clone();
    for _ in 0..30 {
        session.tick(&mut sink);
    }
    assert_eq!(sink.frames, frozen);

    session.pause_handle().resume();
    for _ in 0..30 {
        session.tick(&mut sink);
    }
    assert_ne!(sink.frames, frozen);
}
