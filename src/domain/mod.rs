//! Domain Layer - Core logic for Base Bubbles
//!
//! Pure types and computations with no I/O. Upstream APIs, storage and the
//! physics engine are reached through the ports and bubbles layers.
//!
//! - `token`: flat token view and the bubble sizing metric
//! - `layout`: bubble diameters and initial placement
//! - `chart`: daily close-price series
//! - `format`: base-unit conversions and display formatting
//! - `notification`: push-token records and mini-app lifecycle events
//! - `swap_flow`: price → approve → quote → submit state machine

pub mod token;
pub mod layout;
pub mod chart;
pub mod format;
pub mod notification;
pub mod swap_flow;

pub use token::{sort_tokens, PriceChange, SizeMetric, Token, TokenSortKey, UnknownMetric, BASE_CHAIN_ID};
pub use layout::{compute_sizes, place_bubbles, BubbleSize, LayoutBounds, Placement, SizingConfig, SizingPlan};
pub use chart::{ohlcv_to_chart, ChartPoint};
pub use format::{format_amount, format_change, format_compact_usd, format_units, format_usd, parse_units, AmountError};
pub use notification::{
    notification_key, MiniAppEvent, NotificationDetails, NotificationTokenData, VerifiedEvent,
};
pub use swap_flow::{ReceiptStatus, SwapFlow, SwapFlowError, SwapPrice, SwapQuote, SwapStage};
