//! Base Bubbles - Token Bubble Map Backend Library
//!
//! Trending Base tokens rendered as physics-driven bubbles, with a swap proxy
//! and Farcaster mini-app notification storage.
//!
//! # Modules
//!
//! - `domain`: Core types and rules (Token, bubble sizing, swap flow, notification records)
//! - `bubbles`: rapier2d world and frame animator
//! - `ports`: Trait abstractions (MarketDataPort, SwapPort, NotificationStore, WebhookVerifier)
//! - `adapters`: External implementations (GeckoTerminal, 0x, Upstash, Farcaster, HTTP, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Services and long-running loops

pub mod domain;
pub mod bubbles;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
