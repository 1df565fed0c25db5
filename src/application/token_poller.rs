//! Token Poller
//!
//! Refreshes the bubble token list on an interval and publishes each list
//! over a watch channel. A failed refresh keeps the previous list.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::bubble_service::BubbleService;
use crate::domain::token::Token;
use crate::ports::market_data::MarketDataError;

pub type TokenList = Arc<Vec<Token>>;

pub struct TokenPoller {
    service: Arc<BubbleService>,
    interval: Duration,
    running: watch::Sender<bool>,
    tx: watch::Sender<TokenList>,
}

impl TokenPoller {
    pub fn new(service: Arc<BubbleService>, interval: Duration) -> Self {
        let (tx, _) = watch::channel(Arc::new(Vec::new()));
        let (running, _) = watch::channel(false);
        Self { service, interval, running, tx }
    }

    /// Receiver that sees every published list, starting with the current one
    pub fn subscribe(&self) -> watch::Receiver<TokenList> {
        self.tx.subscribe()
    }

    /// Fetch once and publish on success
    pub async fn refresh(&self) -> Result<usize, MarketDataError> {
        let tokens = self.service.bubble_tokens().await?;
        let count = tokens.len();
        self.tx.send_replace(Arc::new(tokens));
        Ok(count)
    }

    /// Poll until [`stop`](Self::stop) is called. Waiting for the next tick
    /// is cut short by a stop.
    pub async fn run(&self) {
        self.running.send_replace(true);
        let mut running = self.running.subscribe();
        tracing::info!("Token poller started (every {:?})", self.interval);

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stopped(&mut running) => break,
            }
            if !self.is_running() {
                break;
            }
            match self.refresh().await {
                Ok(count) => tracing::info!("Token list refreshed: {} tokens", count),
                Err(e) => tracing::error!("Token refresh failed, keeping previous list: {}", e),
            }
        }

        tracing::info!("Token poller stopped");
    }

    pub async fn stop(&self) {
        self.running.send_replace(false);
        tracing::info!("Stop signal sent to token poller");
    }

    pub fn is_running(&self) -> bool {
        *self.running.borrow()
    }
}

async fn stopped(running: &mut watch::Receiver<bool>) {
    let _ = running.wait_for(|r| !*r).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bubble_service::BubbleServiceConfig;
    use crate::domain::token::fixtures::token;
    use crate::ports::market_data::MockMarketDataPort;

    fn poller(market: MockMarketDataPort) -> TokenPoller {
        let service = BubbleService::new(Arc::new(market), BubbleServiceConfig::default());
        TokenPoller::new(Arc::new(service), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_refresh_publishes() {
        let mut market = MockMarketDataPort::new();
        market
            .expect_fetch_tokens()
            .returning(|_| Ok(vec![token("A", Some(1.0), None), token("B", Some(2.0), None)]));

        let poller = poller(market);
        let mut rx = poller.subscribe();
        assert!(rx.borrow().is_empty());

        assert_eq!(poller.refresh().await.unwrap(), 2);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_list() {
        let mut market = MockMarketDataPort::new();
        let mut calls = 0;
        market.expect_fetch_tokens().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(vec![token("A", Some(1.0), None)])
            } else {
                Err(MarketDataError::RestError("timeout".into()))
            }
        });

        let poller = poller(market);
        let rx = poller.subscribe();
        poller.refresh().await.unwrap();
        assert!(poller.refresh().await.is_err());
        assert_eq!(rx.borrow()[0].symbol, "A");
    }

    #[tokio::test]
    async fn test_run_until_stopped() {
        let mut market = MockMarketDataPort::new();
        market.expect_fetch_tokens().returning(|_| Ok(vec![token("A", Some(1.0), None)]));

        let poller = Arc::new(poller(market));
        let runner = {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run().await })
        };

        let mut rx = poller.subscribe();
        rx.changed().await.unwrap();
        assert!(poller.is_running());

        poller.stop().await;
        tokio::time::timeout(Duration::from_secs(1), runner).await.unwrap().unwrap();
        assert!(!poller.is_running());
    }

    #[tokio::test]
    async fn test_stop_interrupts_long_interval() {
        let mut market = MockMarketDataPort::new();
        market.expect_fetch_tokens().times(1).returning(|_| Ok(vec![token("A", Some(1.0), None)]));

        let service = BubbleService::new(Arc::new(market), BubbleServiceConfig::default());
        let poller = Arc::new(TokenPoller::new(Arc::new(service), Duration::from_secs(600)));
        let runner = {
            let poller = Arc::clone(&poller);
            tokio::spawn(async move { poller.run().await })
        };

        let mut rx = poller.subscribe();
        rx.changed().await.unwrap();

        poller.stop().await;
        tokio::time::timeout(Duration::from_secs(2), runner).await.unwrap().unwrap();
        assert!(!poller.is_running());
    }
}
