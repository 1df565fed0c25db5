//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every section is
//! optional; secrets fall back to environment variables.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::farcaster::HubConfig;
use crate::adapters::gecko::GeckoConfig;
use crate::adapters::store::UpstashConfig;
use crate::adapters::zerox::{ZeroXConfig, SWAP_FEE_BPS, SWAP_FEE_RECIPIENT};
use crate::bubbles::PhysicsConfig;
use crate::domain::layout::SizingConfig;
use crate::domain::token::SizeMetric;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerSection,
    pub market_data: MarketDataSection,
    pub swap: SwapSection,
    pub notifications: NotificationsSection,
    pub bubbles: BubblesSection,
    pub logging: LoggingSection,
}

/// HTTP server section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Listen address, e.g. "0.0.0.0:3000"
    pub bind: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { bind: "0.0.0.0:3000".to_string() }
    }
}

/// GeckoTerminal section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketDataSection {
    pub pools_url: String,
    pub api_url: String,
    pub network: String,
    /// Pool page cache lifetime
    pub cache_ttl_secs: u64,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for MarketDataSection {
    fn default() -> Self {
        let gecko = GeckoConfig::default();
        Self {
            pools_url: gecko.pools_url,
            api_url: gecko.api_url,
            network: gecko.network,
            cache_ttl_secs: gecko.cache_ttl.as_secs(),
            timeout_secs: gecko.timeout.as_secs(),
            max_retries: gecko.max_retries,
        }
    }
}

impl MarketDataSection {
    pub fn gecko_config(&self) -> GeckoConfig {
        GeckoConfig {
            pools_url: self.pools_url.clone(),
            api_url: self.api_url.clone(),
            network: self.network.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            ..GeckoConfig::default()
        }
    }
}

/// 0x swap API section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapSection {
    pub api_url: String,
    /// 0x API key (or ZEROX_API_KEY)
    pub api_key: Option<String>,
    pub fee_recipient: String,
    /// Integrator fee in basis points
    pub fee_bps: u16,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for SwapSection {
    fn default() -> Self {
        Self {
            api_url: ZeroXConfig::default().api_base_url,
            api_key: None,
            fee_recipient: SWAP_FEE_RECIPIENT.to_string(),
            fee_bps: SWAP_FEE_BPS,
            timeout_secs: 20,
            max_retries: 3,
        }
    }
}

impl SwapSection {
    /// Get API key with environment variable fallback
    /// Checks ZEROX_API_KEY env var if config value is empty/None
    pub fn get_api_key(&self) -> Option<String> {
        non_empty(&self.api_key).or_else(|| std::env::var("ZEROX_API_KEY").ok())
    }

    pub fn zerox_config(&self) -> ZeroXConfig {
        ZeroXConfig {
            api_base_url: self.api_url.clone(),
            api_key: self.get_api_key(),
            fee_recipient: self.fee_recipient.clone(),
            fee_bps: self.fee_bps,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
        }
    }
}

/// Notification token storage backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Upstash,
}

/// Notifications and webhook section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsSection {
    pub miniapp_id: String,
    pub backend: StoreBackend,
    /// Upstash REST URL (or KV_REST_API_URL)
    pub kv_rest_api_url: Option<String>,
    /// Upstash REST token (or KV_REST_API_TOKEN)
    pub kv_rest_api_token: Option<String>,
    pub hub_url: String,
    /// Neynar API key (or NEYNAR_API_KEY)
    pub neynar_api_key: Option<String>,
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            miniapp_id: "basebubbles".to_string(),
            backend: StoreBackend::Memory,
            kv_rest_api_url: None,
            kv_rest_api_token: None,
            hub_url: HubConfig::default().hub_url,
            neynar_api_key: None,
        }
    }
}

impl NotificationsSection {
    pub fn get_kv_url(&self) -> Option<String> {
        non_empty(&self.kv_rest_api_url).or_else(|| std::env::var("KV_REST_API_URL").ok())
    }

    pub fn get_kv_token(&self) -> Option<String> {
        non_empty(&self.kv_rest_api_token).or_else(|| std::env::var("KV_REST_API_TOKEN").ok())
    }

    pub fn get_neynar_api_key(&self) -> Option<String> {
        non_empty(&self.neynar_api_key).or_else(|| std::env::var("NEYNAR_API_KEY").ok())
    }

    /// Upstash settings, when both URL and token are available
    pub fn upstash_config(&self) -> Option<UpstashConfig> {
        Some(UpstashConfig::new(self.get_kv_url()?, self.get_kv_token()?))
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            hub_url: self.hub_url.clone(),
            api_key: self.get_neynar_api_key(),
            ..HubConfig::default()
        }
    }
}

/// Bubble map section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BubblesSection {
    /// Tokens shown at once
    pub max_bubbles: usize,
    /// Token list refresh period
    pub poll_interval_secs: u64,
    /// Default viewport for CLI runs and `/api/bubbles`
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub metric: SizeMetric,
    pub sizing: SizingConfig,
    pub physics: PhysicsConfig,
}

impl Default for BubblesSection {
    fn default() -> Self {
        Self {
            max_bubbles: 50,
            poll_interval_secs: 600,
            viewport_width: 390.0,
            viewport_height: 844.0,
            metric: SizeMetric::MarketCap,
            sizing: SizingConfig::default(),
            physics: PhysicsConfig::default(),
        }
    }
}

impl BubblesSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Load configuration from a TOML file; `~` in the path is expanded
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
    let content = std::fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("bind '{}' is not a socket address: {}", self.server.bind, e)))
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if self.market_data.pools_url.is_empty() || self.market_data.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "market_data URLs cannot be empty".to_string(),
            ));
        }

        if self.swap.api_url.is_empty() {
            return Err(ConfigError::ValidationError("swap.api_url cannot be empty".to_string()));
        }

        if self.swap.fee_bps > 10_000 {
            return Err(ConfigError::ValidationError(format!(
                "fee_bps must be 0-10000, got {}",
                self.swap.fee_bps
            )));
        }

        if self.notifications.miniapp_id.is_empty() {
            return Err(ConfigError::ValidationError("miniapp_id cannot be empty".to_string()));
        }

        if self.notifications.backend == StoreBackend::Upstash && self.notifications.upstash_config().is_none() {
            return Err(ConfigError::ValidationError(
                "upstash backend needs kv_rest_api_url and kv_rest_api_token".to_string(),
            ));
        }

        let bubbles = &self.bubbles;
        if bubbles.max_bubbles == 0 {
            return Err(ConfigError::ValidationError("max_bubbles must be > 0".to_string()));
        }

        if bubbles.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError("poll_interval_secs must be > 0".to_string()));
        }

        if bubbles.viewport_width <= 0.0 || bubbles.viewport_height <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "viewport must be positive, got {}x{}",
                bubbles.viewport_width, bubbles.viewport_height
            )));
        }

        if bubbles.sizing.area_fill <= 0.0 || bubbles.sizing.area_fill > 1.0 {
            return Err(ConfigError::ValidationError(format!(
                "area_fill must be in (0, 1], got {}",
                bubbles.sizing.area_fill
            )));
        }

        if bubbles.sizing.min_size_ratio > bubbles.sizing.max_size_ratio {
            return Err(ConfigError::ValidationError(format!(
                "min_size_ratio {} exceeds max_size_ratio {}",
                bubbles.sizing.min_size_ratio, bubbles.sizing.max_size_ratio
            )));
        }

        if bubbles.physics.frame_rate == 0 {
            return Err(ConfigError::ValidationError("frame_rate must be > 0".to_string()));
        }

        Ok(())
    }
}
