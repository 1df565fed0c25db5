use std::sync::Arc;

use crate::application::{BubbleService, NotificationService};
use crate::domain::token::SizeMetric;
use crate::ports::swap::SwapPort;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub bubbles: Arc<BubbleService>,
    pub swap: Arc<dyn SwapPort>,
    pub notifications: Arc<NotificationService>,
    /// Viewport used by `/api/bubbles` when the client sends none
    pub viewport: (f64, f64),
    pub metric: SizeMetric,
}

impl AppState {
    pub fn new(
        bubbles: Arc<BubbleService>,
        swap: Arc<dyn SwapPort>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self { bubbles, swap, notifications, viewport: (390.0, 844.0), metric: SizeMetric::MarketCap }
    }

    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = (width, height);
        self
    }

    pub fn with_metric(mut self, metric: SizeMetric) -> Self {
        self.metric = metric;
        self
    }
}
