//! Bubble Session
//!
//! Runs the animation frame loop for one viewport. The physics world is
//! rebuilt from scratch whenever the token list or the size metric changes.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{watch, RwLock};

use super::bubble_service::BubbleService;
use super::token_poller::TokenList;
use crate::bubbles::{BubbleAnimator, FrameSink, PauseHandle};
use crate::domain::token::{SizeMetric, Token};

pub struct BubbleSession {
    service: Arc<BubbleService>,
    width: f64,
    height: f64,
    metric: SizeMetric,
    pause: PauseHandle,
    is_running: Arc<RwLock<bool>>,
    rng: StdRng,
    animator: Option<BubbleAnimator>,
    rebuilds: u64,
}

impl BubbleSession {
    pub fn new(service: Arc<BubbleService>, width: f64, height: f64, metric: SizeMetric) -> Self {
        Self {
            service,
            width,
            height,
            metric,
            pause: PauseHandle::default(),
            is_running: Arc::new(RwLock::new(false)),
            rng: StdRng::from_entropy(),
            animator: None,
            rebuilds: 0,
        }
    }

    /// Deterministic layout and drift
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn pause_handle(&self) -> PauseHandle {
        self.pause.clone()
    }

    pub fn metric(&self) -> SizeMetric {
        self.metric
    }

    /// Number of worlds built so far
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    pub fn bubble_count(&self) -> usize {
        self.animator.as_ref().map_or(0, |a| a.world().len())
    }

    /// Replace the world with a fresh layout of `tokens`
    pub fn rebuild(&mut self, tokens: &[Token], metric: SizeMetric) {
        self.metric = metric;
        let world = self.service.build_world(tokens, metric, self.width, self.height, &mut self.rng);
        let seed = self.rng.gen();
        self.animator = Some(BubbleAnimator::new(world, self.pause.clone()).with_seed(seed));
        self.rebuilds += 1;
        tracing::debug!("Bubble world rebuilt: {} bubbles by {}", self.bubble_count(), metric);
    }

    /// One frame; false when there is no world yet or it is paused
    pub fn tick(&mut self, sink: &mut dyn FrameSink) -> bool {
        match self.animator.as_mut() {
            Some(animator) => animator.tick(sink),
            None => false,
        }
    }

    /// Frame loop at `frame_rate` until stopped or `max_frames` frames ran
    pub async fn run(
        &mut self,
        mut tokens: watch::Receiver<TokenList>,
        mut metric: watch::Receiver<SizeMetric>,
        sink: &mut dyn FrameSink,
        frame_rate: u32,
        max_frames: Option<u64>,
    ) {
        *self.is_running.write().await = true;

        let current = tokens.borrow_and_update().clone();
        let initial_metric = *metric.borrow_and_update();
        self.rebuild(&current, initial_metric);

        let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / frame_rate.max(1) as f64));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut frames = 0u64;

        tracing::info!("Bubble session started at {} fps", frame_rate);

        while *self.is_running.read().await {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(sink);
                    frames += 1;
                    if max_frames.is_some_and(|max| frames >= max) {
                        break;
                    }
                }
                Ok(()) = tokens.changed() => {
                    let list = tokens.borrow_and_update().clone();
                    self.rebuild(&list, self.metric);
                }
                Ok(()) = metric.changed() => {
                    let next = *metric.borrow_and_update();
                    let list = tokens.borrow().clone();
                    self.rebuild(&list, next);
                }
            }
        }

        *self.is_running.write().await = false;
        tracing::info!("Bubble session stopped after {} frames", frames);
    }

    pub fn stop_handle(&self) -> Arc<RwLock<bool>> {
        Arc::clone(&self.is_running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bubble_service::BubbleServiceConfig;
    use crate::bubbles::LatestFrame;
    use crate::domain::token::fixtures::token;
    use crate::ports::market_data::MockMarketDataPort;

    fn session() -> BubbleSession {
        let service = BubbleService::new(Arc::new(MockMarketDataPort::new()), BubbleServiceConfig::default());
        BubbleSession::new(Arc::new(service), 390.0, 844.0, SizeMetric::MarketCap).with_seed(3)
    }

    fn list(n: usize) -> TokenList {
        Arc::new((0..n).map(|i| token(&format!("S{}", i), Some(10.0 * (i + 1) as f64), Some(i as f64))).collect())
    }

    #[test]
    fn test_no_world_no_frames() {
        let mut session = session();
        let mut sink = LatestFrame::default();
        assert!(!session.tick(&mut sink));
        assert_eq!(sink.writes, 0);
    }

    #[test]
    fn test_pause_survives_rebuild() {
        let mut session = session();
        let pause = session.pause_handle();
        pause.pause();

        session.rebuild(&list(4), SizeMetric::Change1h);
        let mut sink = LatestFrame::default();
        assert!(!session.tick(&mut sink));
        assert_eq!(sink.frames.len(), 4);

        pause.resume();
        assert!(session.tick(&mut sink));
    }

    #[tokio::test]
    async fn test_run_rebuilds_on_token_refresh() {
        let mut session = session();
        let (tokens_tx, tokens_rx) = watch::channel(list(3));
        let (_metric_tx, metric_rx) = watch::channel(SizeMetric::MarketCap);
        let mut sink = LatestFrame::default();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tokens_tx.send_replace(list(7));
        });
        session.run(tokens_rx, metric_rx, &mut sink, 200, Some(60)).await;

        assert_eq!(session.rebuilds(), 2);
        assert_eq!(session.bubble_count(), 7);
        assert_eq!(sink.frames.len(), 7);
    }

    #[tokio::test]
    async fn test_metric_change_rebuilds() {
        let mut session = session();
        let (_tokens_tx, tokens_rx) = watch::channel(list(5));
        let (metric_tx, metric_rx) = watch::channel(SizeMetric::MarketCap);
        let mut sink = LatestFrame::default();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            metric_tx.send_replace(SizeMetric::Change24h);
        });
        session.run(tokens_rx, metric_rx, &mut sink, 200, Some(60)).await;

        assert_eq!(session.metric(), SizeMetric::Change24h);
        assert_eq!(session.rebuilds(), 2);
        assert_eq!(session.bubble_count(), 5);
    }
}
