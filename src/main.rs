//! Base Bubbles - token bubble map, swap proxy and mini-app notification backend

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use base_bubbles::adapters::cli::{BubblesCmd, CliApp, Command, PriceCmd, QuoteCmd, ServeCmd, SimulateCmd, TokensCmd};
use base_bubbles::adapters::farcaster::{HubKeyVerifier, JsonSignatureVerifier};
use base_bubbles::adapters::gecko::GeckoClient;
use base_bubbles::adapters::http::{self, AppState};
use base_bubbles::adapters::store::{MemoryStore, UpstashStore};
use base_bubbles::adapters::zerox::ZeroXClient;
use base_bubbles::application::{
    BubbleService, BubbleServiceConfig, BubbleSession, NotificationService, SwapSession, TokenPoller,
};
use base_bubbles::bubbles::{BubbleFrame, FrameSink, LatestFrame};
use base_bubbles::config::{load_config, Config, StoreBackend};
use base_bubbles::domain::format::{format_amount, format_change, format_compact_usd, format_raw_units, format_usd, parse_units};
use base_bubbles::domain::swap_flow::SwapStage;
use base_bubbles::domain::token::sort_tokens;
use base_bubbles::ports::market_data::{TokenQuery, DEFAULT_SORT};
use base_bubbles::ports::notification_store::NotificationStore;
use base_bubbles::ports::swap::{SwapParams, SwapPort};

#[tokio::main]
async fn main() -> Result<()> {
    // Secrets (ZEROX_API_KEY, KV_REST_API_*, NEYNAR_API_KEY) go in .env, not config.toml
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config = load(config_path(&app.command))?;
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Serve(cmd) => serve_command(cmd, config).await,
        Command::Tokens(cmd) => tokens_command(cmd, config).await,
        Command::Bubbles(cmd) => bubbles_command(cmd, config).await,
        Command::Simulate(cmd) => simulate_command(cmd, config).await,
        Command::Price(cmd) => price_command(cmd, config).await,
        Command::Quote(cmd) => quote_command(cmd, config).await,
    }
}

fn config_path(command: &Command) -> &Path {
    match command {
        Command::Serve(cmd) => &cmd.config,
        Command::Tokens(cmd) => &cmd.config,
        Command::Bubbles(cmd) => &cmd.config,
        Command::Simulate(cmd) => &cmd.config,
        Command::Price(cmd) => &cmd.config,
        Command::Quote(cmd) => &cmd.config,
    }
}

fn load(path: &Path) -> Result<Config> {
    load_config(path).with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    fmt().with_env_filter(filter).with_target(false).init();
    Ok(())
}

fn bubble_service(config: &Config) -> Result<Arc<BubbleService>> {
    let gecko = GeckoClient::with_config(config.market_data.gecko_config())
        .context("Failed to create GeckoTerminal client")?;
    let service_config = BubbleServiceConfig {
        max_bubbles: config.bubbles.max_bubbles,
        sizing: config.bubbles.sizing.clone(),
        physics: config.bubbles.physics.clone(),
    };
    Ok(Arc::new(BubbleService::new(Arc::new(gecko), service_config)))
}

fn swap_client(config: &Config) -> Result<Arc<dyn SwapPort>> {
    let client = ZeroXClient::with_config(config.swap.zerox_config()).context("Failed to create 0x client")?;
    if config.swap.get_api_key().is_none() {
        tracing::warn!("ZEROX_API_KEY is not set; 0x requests will be rejected upstream");
    }
    Ok(Arc::new(client))
}

fn notification_store(config: &Config) -> Result<Arc<dyn NotificationStore>> {
    match config.notifications.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory notification store; tokens are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Upstash => {
            let upstash = config
                .notifications
                .upstash_config()
                .context("KV_REST_API_URL and KV_REST_API_TOKEN are required for the upstash backend")?;
            let store = UpstashStore::new(upstash).context("Failed to create Upstash client")?;
            Ok(Arc::new(store))
        }
    }
}

fn notification_service(config: &Config) -> Result<Arc<NotificationService>> {
    let hub = HubKeyVerifier::new(config.notifications.hub_config()).context("Failed to create hub client")?;
    let verifier = JsonSignatureVerifier::new(Arc::new(hub));
    Ok(Arc::new(NotificationService::new(
        Arc::new(verifier),
        notification_store(config)?,
        config.notifications.miniapp_id.clone(),
    )))
}

async fn serve_command(cmd: ServeCmd, mut config: Config) -> Result<()> {
    if let Some(bind) = cmd.bind {
        config.server.bind = bind;
    }
    let addr = config.bind_addr().context("Invalid bind address")?;

    let state = AppState::new(bubble_service(&config)?, swap_client(&config)?, notification_service(&config)?)
        .with_viewport(config.bubbles.viewport_width, config.bubbles.viewport_height)
        .with_metric(config.bubbles.metric);

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
    };

    tracing::info!("Starting base-bubbles API...");
    http::serve(addr, state, shutdown).await.context("HTTP server failed")?;
    tracing::info!("base-bubbles stopped");
    Ok(())
}

async fn tokens_command(cmd: TokensCmd, config: Config) -> Result<()> {
    let service = bubble_service(&config)?;
    let query = TokenQuery { page: cmd.page, sort: cmd.sort.unwrap_or_else(|| DEFAULT_SORT.to_string()) };

    let mut tokens = service.tokens(&query).await.context("Failed to fetch tokens")?;
    if let Some(key) = cmd.order_by {
        sort_tokens(&mut tokens, key, !cmd.asc);
    }

    println!("{:<10} {:>14} {:>10} {:>10} {:>10} {:>10}", "SYMBOL", "PRICE", "MCAP", "VOL 24H", "1H", "24H");
    for token in tokens.iter().take(cmd.limit) {
        println!(
            "{:<10} {:>14} {:>10} {:>10} {:>10} {:>10}",
            token.symbol,
            token.price.map(format_usd).unwrap_or_else(|| "N/A".to_string()),
            format_compact_usd(token.market_cap),
            format_compact_usd(token.volume_24h),
            format_change(token.change.h1),
            format_change(token.change.h24),
        );
    }
    println!("\n{} of {} tokens (page {})", tokens.len().min(cmd.limit), tokens.len(), cmd.page);
    Ok(())
}

async fn bubbles_command(cmd: BubblesCmd, config: Config) -> Result<()> {
    let service = bubble_service(&config)?;
    let metric = cmd.metric.unwrap_or(config.bubbles.metric);
    let width = cmd.width.unwrap_or(config.bubbles.viewport_width);
    let height = cmd.height.unwrap_or(config.bubbles.viewport_height);

    let tokens = service.bubble_tokens().await.context("Failed to fetch tokens")?;
    let layout = service.layout(&tokens, metric, width, height, &mut rand::thread_rng());

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    println!(
        "Layout for {}x{} by {} (sizes {:.1}-{:.1}px, scale {:.3})",
        width, height, metric, layout.bounds.min_size, layout.bounds.max_size, layout.scale_factor
    );
    for bubble in &layout.bubbles {
        println!(
            "  {:<10} {:>7.1}px at ({:>6.1}, {:>6.1}) {:>9}{}",
            bubble.symbol,
            bubble.size,
            bubble.x,
            bubble.y,
            format_change(bubble.change),
            if bubble.pinned { "  [min]" } else { "" }
        );
    }
    Ok(())
}

/// Logs a one-line summary once per second of frames
struct LogSink {
    every: u64,
    seen: u64,
}

impl FrameSink for LogSink {
    fn write_frames(&mut self, frames: &[BubbleFrame]) {
        self.seen += 1;
        if self.seen % self.every == 0 {
            let (sx, sy) = frames.iter().map(BubbleFrame::center).fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
            let n = frames.len().max(1) as f64;
            tracing::info!("Frame {}: {} bubbles, centroid ({:.1}, {:.1})", self.seen, frames.len(), sx / n, sy / n);
        }
    }
}

async fn simulate_command(cmd: SimulateCmd, config: Config) -> Result<()> {
    let service = bubble_service(&config)?;
    let metric = cmd.metric.unwrap_or(config.bubbles.metric);
    let frame_rate = config.bubbles.physics.frame_rate;

    let mut session = BubbleSession::new(
        Arc::clone(&service),
        config.bubbles.viewport_width,
        config.bubbles.viewport_height,
        metric,
    );
    if let Some(seed) = cmd.seed {
        session = session.with_seed(seed);
    }

    if cmd.follow {
        let poller = Arc::new(TokenPoller::new(Arc::clone(&service), config.bubbles.poll_interval()));
        poller.refresh().await.context("Initial token fetch failed")?;
        let tokens_rx = poller.subscribe();
        let (_metric_tx, metric_rx) = watch::channel(metric);

        let runner = {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run().await })
        };

        let session_flag = session.stop_handle();
        let signal_poller = Arc::clone(&poller);
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown signal received");
            *session_flag.write().await = false;
            signal_poller.stop().await;
        });

        let mut sink = LogSink { every: u64::from(frame_rate.max(1)), seen: 0 };
        session.run(tokens_rx, metric_rx, &mut sink, frame_rate, None).await;
        poller.stop().await;
        runner.await.context("Token poller task failed")?;
        return Ok(());
    }

    let tokens = service.bubble_tokens().await.context("Failed to fetch tokens")?;
    session.rebuild(&tokens, metric);

    let mut sink = LatestFrame::default();
    for _ in 0..cmd.frames {
        session.tick(&mut sink);
    }

    println!("{} bubbles after {} frames ({:.1}s at {} fps):", sink.frames.len(), sink.writes, sink.writes as f64 / frame_rate.max(1) as f64, frame_rate);
    for frame in &sink.frames {
        let symbol = tokens.get(frame.index).map_or("?", |t| t.symbol.as_str());
        println!("  {:<10} {:>7.1}px {}", symbol, frame.size, frame.transform_css());
    }
    Ok(())
}

fn swap_params(buy: &str, sell: &str, amount: &str, decimals: u32, chain_id: Option<u64>, taker: Option<&str>) -> Result<SwapParams> {
    let raw = parse_units(amount, decimals).with_context(|| format!("Invalid sell amount '{}'", amount))?;
    let mut params = SwapParams::new(buy, sell, &raw.to_string());
    params.chain_id = chain_id;
    if let Some(taker) = taker {
        params = params.with_taker(taker);
    }
    Ok(params)
}

fn display_amount(raw: Option<&str>, decimals: u32) -> String {
    raw.and_then(|r| format_raw_units(r, decimals).ok())
        .map(format_amount)
        .unwrap_or_else(|| "N/A".to_string())
}

async fn price_command(cmd: PriceCmd, config: Config) -> Result<()> {
    let params = swap_params(&cmd.buy_token, &cmd.sell_token, &cmd.amount, cmd.sell_decimals, cmd.chain_id, cmd.taker.as_deref())?;
    let session = SwapSession::new(swap_client(&config)?);

    let stage = session.request_price(params).await.context("Failed to fetch price")?;
    let price = match &stage {
        SwapStage::PriceReady { price } | SwapStage::AwaitingApproval { price, .. } => price,
        other => anyhow::bail!("Unexpected swap stage: {}", other.name()),
    };

    println!("Sell {} -> buy {}", cmd.amount, display_amount(price.buy_amount.as_deref(), cmd.buy_decimals));
    if price.liquidity_available == Some(false) {
        println!("  No liquidity available for this pair");
    }
    if let SwapStage::AwaitingApproval { spender, .. } = &stage {
        println!("  Allowance required for spender {}", spender);
    }
    Ok(())
}

async fn quote_command(cmd: QuoteCmd, config: Config) -> Result<()> {
    let params = swap_params(&cmd.buy_token, &cmd.sell_token, &cmd.amount, cmd.sell_decimals, cmd.chain_id, Some(&cmd.taker))?;
    let session = SwapSession::new(swap_client(&config)?);

    let stage = session.request_price(params.clone()).await.context("Failed to fetch price")?;
    if let SwapStage::AwaitingApproval { spender, .. } = &stage {
        println!("Allowance required for spender {} (assuming it is granted)", spender);
        session.approval_confirmed().await?;
    }

    let quote = session.request_quote(&params).await.context("Quote rejected")?;
    println!("Sell {} -> buy {}", cmd.amount, display_amount(quote.buy_amount.as_deref(), cmd.buy_decimals));
    if let Some(tx) = &quote.transaction {
        println!("  to:    {}", tx.to.as_deref().unwrap_or_default());
        println!("  value: {}", tx.value.as_deref().unwrap_or("0"));
        println!("  gas:   {}", tx.gas.as_deref().unwrap_or("N/A"));
        println!("  data:  {} bytes", tx.data.as_deref().map_or(0, |d| d.trim_start_matches("0x").len() / 2));
    }
    Ok(())
}
