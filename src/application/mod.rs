//! Application Layer - Use cases wiring ports to the domain
//!
//! - `bubble_service`: token fetch and bubble layout
//! - `token_poller`: periodic token refresh
//! - `bubble_session`: animation frame loop
//! - `swap_session`: swap flow with superseded price requests
//! - `notification_service`: webhook events and notification status

pub mod bubble_service;
pub mod token_poller;
pub mod bubble_session;
pub mod swap_session;
pub mod notification_service;

pub use bubble_service::{BubbleLayout, BubbleService, BubbleServiceConfig, LaidOutBubble};
pub use token_poller::{TokenList, TokenPoller};
pub use bubble_session::BubbleSession;
pub use swap_session::{SwapSession, SwapSessionError};
pub use notification_service::{NotificationService, WebhookError, WebhookOutcome};
