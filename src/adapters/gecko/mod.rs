//! GeckoTerminal adapter
//!
//! Pool listings and OHLCV history for the bubble map and token charts.

pub mod client;
pub mod convert;
pub mod types;

pub use client::{GeckoClient, GeckoConfig};
pub use convert::{pool_to_token, response_to_tokens};
