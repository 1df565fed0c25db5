//! 0x swap aggregator adapter

pub mod client;

pub use client::{ZeroXClient, ZeroXConfig, SWAP_FEE_BPS, SWAP_FEE_RECIPIENT};
