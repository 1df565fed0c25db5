//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement:
//! - Market data (token listings, price history)
//! - Swap aggregation (price, quote)
//! - Notification token storage
//! - Webhook signature and app-key verification

pub mod market_data;
pub mod swap;
pub mod notification_store;
pub mod webhook;

pub use market_data::{MarketDataError, MarketDataPort, TokenQuery, DEFAULT_SORT};
pub use swap::{SwapError, SwapParams, SwapPort};
pub use notification_store::{NotificationStore, StoreError};
pub use webhook::{AppKeyCheck, AppKeyVerifier, VerifyError, WebhookVerifier};
