//! CLI Command Definitions
//!
//! Argument structs for every base-bubbles command. Handlers live in `main.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::token::{SizeMetric, TokenSortKey};

/// Base Bubbles - token bubble map and swap backend for Base
#[derive(Parser, Debug)]
#[command(
    name = "base-bubbles",
    version = env!("CARGO_PKG_VERSION"),
    about = "Token bubble map, swap proxy and mini-app notification backend for Base",
    long_about = "Base Bubbles serves trending Base tokens as a physics-driven bubble map, \
                  proxies 0x swap prices and quotes, and stores Farcaster mini-app \
                  notification tokens received through signed webhooks."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve(ServeCmd),

    /// List trending Base tokens
    Tokens(TokensCmd),

    /// Print an initial bubble layout
    Bubbles(BubblesCmd),

    /// Run the bubble physics headless and print final positions
    Simulate(SimulateCmd),

    /// Get an indicative swap price
    Price(PriceCmd),

    /// Get a firm swap quote with transaction data
    Quote(QuoteCmd),
}

/// Run the HTTP API
#[derive(Parser, Debug)]
pub struct ServeCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Override bind address
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

/// List tokens
#[derive(Parser, Debug)]
pub struct TokensCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Page of pools to fetch
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Upstream sort (e.g. -24h_trend_score)
    #[arg(long, value_name = "SORT")]
    pub sort: Option<String>,

    /// Local sort: symbol, price, market_cap, volume, change
    #[arg(long, value_name = "KEY")]
    pub order_by: Option<TokenSortKey>,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,

    /// Maximum rows to print
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Print a bubble layout
#[derive(Parser, Debug)]
pub struct BubblesCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Size metric: market_cap, 1h, 6h, 24h
    #[arg(short, long, value_name = "METRIC")]
    pub metric: Option<SizeMetric>,

    /// Viewport width in pixels
    #[arg(long)]
    pub width: Option<f64>,

    /// Viewport height in pixels
    #[arg(long)]
    pub height: Option<f64>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Headless physics run
#[derive(Parser, Debug)]
pub struct SimulateCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Size metric: market_cap, 1h, 6h, 24h
    #[arg(short, long, value_name = "METRIC")]
    pub metric: Option<SizeMetric>,

    /// Frames to simulate
    #[arg(long, default_value = "300")]
    pub frames: u64,

    /// Seed for layout and drift
    #[arg(long)]
    pub seed: Option<u64>,

    /// Keep polling tokens and animating until Ctrl+C
    #[arg(long)]
    pub follow: bool,
}

/// Indicative swap price
#[derive(Parser, Debug)]
pub struct PriceCmd {
    /// Token to buy (address)
    #[arg(value_name = "BUY_TOKEN")]
    pub buy_token: String,

    /// Token to sell (address)
    #[arg(value_name = "SELL_TOKEN")]
    pub sell_token: String,

    /// Amount to sell, in whole tokens
    #[arg(value_name = "AMOUNT")]
    pub amount: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Decimals of the sell token
    #[arg(long, default_value = "18")]
    pub sell_decimals: u32,

    /// Decimals of the buy token
    #[arg(long, default_value = "18")]
    pub buy_decimals: u32,

    /// Chain id (defaults to Base)
    #[arg(long, value_name = "ID")]
    pub chain_id: Option<u64>,

    /// Taker address
    #[arg(long, value_name = "ADDRESS")]
    pub taker: Option<String>,
}

/// Firm swap quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Token to buy (address)
    #[arg(value_name = "BUY_TOKEN")]
    pub buy_token: String,

    /// Token to sell (address)
    #[arg(value_name = "SELL_TOKEN")]
    pub sell_token: String,

    /// Amount to sell, in whole tokens
    #[arg(value_name = "AMOUNT")]
    pub amount: String,

    /// Taker address that will sign the transaction
    #[arg(long, value_name = "ADDRESS")]
    pub taker: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
    pub config: PathBuf,

    /// Decimals of the sell token
    #[arg(long, default_value = "18")]
    pub sell_decimals: u32,

    /// Decimals of the buy token
    #[arg(long, default_value = "18")]
    pub buy_decimals: u32,

    /// Chain id (defaults to Base)
    #[arg(long, value_name = "ID")]
    pub chain_id: Option<u64>,
}
