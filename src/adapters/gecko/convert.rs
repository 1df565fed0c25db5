//! Pool → Token conversion

use super::types::{GeckoPool, IncludedItem, PoolsResponse};
use crate::domain::token::{PriceChange, Token, BASE_CHAIN_ID};

/// Parse a numeric string, `None` when empty or invalid
fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .filter(|v| !v.is_empty())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parse `"+3.2%"` / `"-1.5%"`
fn parse_percent(value: Option<&str>) -> Option<f64> {
    parse_number(value.map(|v| v.replace(['%', '+'], "")).as_deref())
}

fn find_token<'a>(id: &str, included: &'a [IncludedItem]) -> Option<&'a IncludedItem> {
    included.iter().find(|item| item.kind == "token" && item.id == id)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

/// Flatten a pool into its base token.
///
/// Pools are listed under the Base network endpoint, so every token is
/// tagged with the Base chain id.
pub fn pool_to_token(pool: &GeckoPool, included: &[IncludedItem]) -> Token {
    let attrs = &pool.attributes;
    let base = find_token(&attrs.base_token_id, included).map(|t| &t.attributes);

    let pool_symbol = attrs.name.split(" / ").next().unwrap_or_default().trim().to_string();

    let address = base
        .and_then(|b| non_empty(b.address.as_ref()))
        .unwrap_or(attrs.address.as_str())
        .to_string();
    let name = base
        .and_then(|b| non_empty(b.name.as_ref()))
        .map(str::to_string)
        .unwrap_or_else(|| pool_symbol.clone());
    let symbol = base
        .and_then(|b| non_empty(b.symbol.as_ref()))
        .map(str::to_string)
        .unwrap_or(pool_symbol);

    let market_cap = attrs
        .token_value_data
        .get(&attrs.base_token_id)
        .and_then(|v| v.market_cap_in_usd)
        .filter(|v| *v != 0.0);

    let changes = &attrs.price_percent_changes;

    Token {
        id: pool.id.clone(),
        address,
        chain: BASE_CHAIN_ID,
        name,
        symbol,
        price: parse_number(attrs.price_in_usd.as_deref()),
        market_cap,
        volume_24h: parse_number(attrs.from_volume_in_usd.as_deref()),
        liquidity: parse_number(attrs.reserve_in_usd.as_deref()),
        change: PriceChange {
            h1: parse_percent(changes.last_1h.as_deref()),
            h6: parse_percent(changes.last_6h.as_deref()),
            h24: parse_percent(changes.last_24h.as_deref()),
        },
        image: base.and_then(|b| b.image_url.clone()).unwrap_or_default(),
        deployed_at: attrs.pool_created_at.clone(),
    }
}

/// Convert a pools page, skipping pools that do not have the expected shape
pub fn response_to_tokens(response: &PoolsResponse) -> Vec<Token> {
    let tokens: Vec<Token> = response
        .data
        .iter()
        .filter_map(|raw| match serde_json::from_value::<GeckoPool>(raw.clone()) {
            Ok(pool) => Some(pool_to_token(&pool, &response.included)),
            Err(e) => {
                let id = raw.get("id").and_then(|v| v.as_str()).unwrap_or("<unknown>");
                tracing::warn!("Skipping pool {}: {}", id, e);
                None
            }
        })
        .collect();

    tracing::debug!(
        "Converted {} of {} pools ({} included items)",
        tokens.len(),
        response.data.len(),
        response.included.len()
    );

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> PoolsResponse {
        serde_json::from_value(json!({
            "data": [
                {
                    "id": "1001",
                    "type": "pool",
                    "attributes": {
                        "address": "0xpool1",
                        "name": "DEGEN / WETH",
                        "from_volume_in_usd": "125000.5",
                        "price_percent_changes": { "last_1h": "+1.5%", "last_6h": "-2.25%", "last_24h": "+10%" },
                        "base_token_id": "tok-degen",
                        "token_value_data": { "tok-degen": { "market_cap_in_usd": 250000000.0 } },
                        "price_in_usd": "0.0123",
                        "reserve_in_usd": "900000",
                        "pool_created_at": "2024-01-02T03:04:05Z"
                    },
                    "relationships": {}
                },
                {
                    "id": "1002",
                    "type": "pool",
                    "attributes": {
                        "address": "0xpool2",
                        "name": "MYSTERY / USDC",
                        "price_percent_changes": { "last_1h": "", "last_6h": "n/a" },
                        "base_token_id": "tok-missing",
                        "token_value_data": {},
                        "price_in_usd": "abc"
                    }
                },
                { "id": "broken", "type": "pool", "attributes": { "name": "NO FIELDS" } }
            ],
            "included": [
                { "id": "uniswap", "type": "dex", "attributes": { "name": "Uniswap V3" } },
                {
                    "id": "tok-degen",
                    "type": "token",
                    "attributes": {
                        "address": "0xdegen",
                        "name": "Degen",
                        "symbol": "DEGEN",
                        "image_url": "https://img/degen.png"
                    }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_pool_with_included_base_token() {
        let tokens = response_to_tokens(&page());
        let degen = &tokens[0];

        assert_eq!(degen.id, "1001");
        assert_eq!(degen.address, "0xdegen");
        assert_eq!(degen.symbol, "DEGEN");
        assert_eq!(degen.name, "Degen");
        assert_eq!(degen.chain, 8453);
        assert_eq!(degen.price, Some(0.0123));
        assert_eq!(degen.market_cap, Some(250_000_000.0));
        assert_eq!(degen.volume_24h, Some(125_000.5));
        assert_eq!(degen.liquidity, Some(900_000.0));
        assert_eq!(degen.change.h1, Some(1.5));
        assert_eq!(degen.change.h6, Some(-2.25));
        assert_eq!(degen.change.h24, Some(10.0));
        assert_eq!(degen.image, "https://img/degen.png");
        assert_eq!(degen.deployed_at.as_deref(), Some("2024-01-02T03:04:05Z"));
    }

    #[test]
    fn test_pool_without_base_token_falls_back_to_pool_name() {
        let tokens = response_to_tokens(&page());
        let mystery = &tokens[1];

        assert_eq!(mystery.address, "0xpool2");
        assert_eq!(mystery.symbol, "MYSTERY");
        assert_eq!(mystery.name, "MYSTERY");
        assert_eq!(mystery.price, None);
        assert_eq!(mystery.market_cap, None);
        assert_eq!(mystery.change, PriceChange::default());
        assert!(mystery.image.is_empty());
    }

    #[test]
    fn test_malformed_pool_skipped() {
        let tokens = response_to_tokens(&page());
        assert_eq!(tokens.len(), 2);
        assert!(tokens.iter().all(|t| t.id != "broken"));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent(Some("+0.5%")), Some(0.5));
        assert_eq!(parse_percent(Some("-12%")), Some(-12.0));
        assert_eq!(parse_percent(Some("")), None);
        assert_eq!(parse_percent(None), None);
    }
}
