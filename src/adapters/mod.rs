//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - GeckoTerminal: pool listings and OHLCV charts
//! - 0x: swap prices and quotes
//! - Store: notification tokens in memory or Upstash Redis
//! - Farcaster: webhook signatures and app-key lookups
//! - HTTP: axum routes
//! - CLI: Command-line interface definitions

pub mod retry;
pub mod gecko;
pub mod zerox;
pub mod store;
pub mod farcaster;
pub mod http;
pub mod cli;

pub use gecko::GeckoClient;
pub use zerox::ZeroXClient;
pub use store::{MemoryStore, UpstashStore};
pub use farcaster::{HubKeyVerifier, JsonSignatureVerifier};
pub use http::AppState;
pub use cli::CliApp;
