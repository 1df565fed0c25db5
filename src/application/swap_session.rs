//! Swap Session
//!
//! Couples the swap port with the [`SwapFlow`] state machine for one user.
//! Price requests are superseded: starting a new one aborts the request
//! still in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;

use crate::domain::swap_flow::{ReceiptStatus, SwapFlow, SwapFlowError, SwapPrice, SwapQuote, SwapStage};
use crate::ports::swap::{SwapError, SwapParams, SwapPort};

#[derive(Debug, Error)]
pub enum SwapSessionError {
    #[error("Price request superseded by a newer one")]
    Superseded,
    #[error(transparent)]
    Swap(#[from] SwapError),
    #[error(transparent)]
    Flow(#[from] SwapFlowError),
    #[error("Unexpected response shape: {0}")]
    Decode(String),
    #[error("Request task failed: {0}")]
    Task(String),
}

pub struct SwapSession {
    swap: Arc<dyn SwapPort>,
    flow: Mutex<SwapFlow>,
    /// Latest price request: its sequence number and abort handle
    in_flight: Mutex<Option<(u64, AbortHandle)>>,
    next_request: AtomicU64,
}

impl SwapSession {
    pub fn new(swap: Arc<dyn SwapPort>) -> Self {
        Self {
            swap,
            flow: Mutex::new(SwapFlow::new()),
            in_flight: Mutex::new(None),
            next_request: AtomicU64::new(0),
        }
    }

    pub async fn stage(&self) -> SwapStage {
        self.flow.lock().await.stage().clone()
    }

    /// Fetch an indicative price, aborting any earlier request still running
    pub async fn request_price(&self, params: SwapParams) -> Result<SwapStage, SwapSessionError> {
        let swap = Arc::clone(&self.swap);
        let handle = tokio::spawn(async move { swap.get_price(&params).await });
        let request = {
            let mut in_flight = self.in_flight.lock().await;
            let request = self.next_request.fetch_add(1, Ordering::SeqCst);
            if let Some((_, previous)) = in_flight.replace((request, handle.abort_handle())) {
                previous.abort();
            }
            request
        };

        let value = match handle.await {
            Ok(result) => result?,
            Err(e) if e.is_cancelled() => {
                tracing::debug!("Price request superseded");
                return Err(SwapSessionError::Superseded);
            }
            Err(e) => return Err(SwapSessionError::Task(e.to_string())),
        };

        let price: SwapPrice = serde_json::from_value(value).map_err(|e| SwapSessionError::Decode(e.to_string()))?;
        let mut flow = self.flow.lock().await;
        let current = self.in_flight.lock().await.as_ref().map(|(id, _)| *id);
        if current != Some(request) {
            tracing::debug!("Dropping stale price response");
            return Err(SwapSessionError::Superseded);
        }
        let stage = flow.price_received(price)?.clone();
        tracing::info!("Swap stage: {}", stage.name());
        Ok(stage)
    }

    /// Fetch a firm quote and move to review when it is signable
    pub async fn request_quote(&self, params: &SwapParams) -> Result<SwapQuote, SwapSessionError> {
        let value = self.swap.get_quote(params).await?;
        let quote: SwapQuote = serde_json::from_value(value).map_err(|e| SwapSessionError::Decode(e.to_string()))?;

        let mut flow = self.flow.lock().await;
        flow.quote_received(quote.clone())?;
        tracing::info!("Quote ready for review");
        Ok(quote)
    }

    pub async fn approval_confirmed(&self) -> Result<SwapStage, SwapSessionError> {
        Ok(self.flow.lock().await.approval_confirmed()?.clone())
    }

    pub async fn submitted(&self, tx_hash: &str) -> Result<SwapStage, SwapSessionError> {
        tracing::info!("Swap submitted: {}", tx_hash);
        Ok(self.flow.lock().await.submitted(tx_hash)?.clone())
    }

    pub async fn receipt(&self, status: ReceiptStatus) -> Result<SwapStage, SwapSessionError> {
        let stage = self.flow.lock().await.receipt(status)?.clone();
        match &stage {
            SwapStage::Failed { reason } => tracing::warn!("Swap failed: {}", reason),
            _ => tracing::info!("Swap confirmed"),
        }
        Ok(stage)
    }

    pub async fn reset(&self) {
        self.flow.lock().await.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::swap::MockSwapPort;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::time::Duration;

    /// Price endpoint that answers slowly for a sell amount of "slow"
    struct SlowPrices;

    #[async_trait]
    impl SwapPort for SlowPrices {
        async fn get_price(&self, params: &SwapParams) -> Result<Value, SwapError> {
            if params.sell_amount.as_deref() == Some("slow") {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(json!({ "buyAmount": "42", "sellAmount": params.sell_amount }))
        }

        async fn get_quote(&self, _params: &SwapParams) -> Result<Value, SwapError> {
            Ok(json!({}))
        }
    }

    #[tokio::test]
    async fn test_newer_price_supersedes_older() {
        let session = Arc::new(SwapSession::new(Arc::new(SlowPrices)));

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.request_price(SwapParams::new("0xb", "0xs", "slow")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let second = session.request_price(SwapParams::new("0xb", "0xs", "100")).await.unwrap();
        assert_eq!(second.name(), "price_ready");

        let first = tokio::time::timeout(Duration::from_secs(1), first).await.unwrap().unwrap();
        assert!(matches!(first, Err(SwapSessionError::Superseded)));
    }

    #[tokio::test]
    async fn test_finished_price_is_dropped_when_superseded() {
        let session = Arc::new(SwapSession::new(Arc::new(SlowPrices)));
        let flow = session.flow.lock().await;

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.request_price(SwapParams::new("0xb", "0xs", "100")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.request_price(SwapParams::new("0xb", "0xs", "200")).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        drop(flow);

        let first = tokio::time::timeout(Duration::from_secs(1), first).await.unwrap().unwrap();
        assert!(matches!(first, Err(SwapSessionError::Superseded)));
        let second = tokio::time::timeout(Duration::from_secs(1), second).await.unwrap().unwrap();
        assert_eq!(second.unwrap().name(), "price_ready");
    }

    #[tokio::test]
    async fn test_quote_flow() {
        let mut swap = MockSwapPort::new();
        swap.expect_get_price()
            .returning(|_| Ok(json!({ "buyAmount": "1", "issues": { "allowance": { "spender": "0xallow" } } })));
        swap.expect_get_quote()
            .returning(|_| Ok(json!({ "buyAmount": "1", "transaction": { "to": "0xto", "data": "0xdata" } })));

        let session = SwapSession::new(Arc::new(swap));
        let params = SwapParams::new("0xb", "0xs", "5");

        let stage = session.request_price(params.clone()).await.unwrap();
        assert_eq!(stage.name(), "awaiting_approval");
        assert!(matches!(session.request_quote(&params).await, Err(SwapSessionError::Flow(_))));

        session.approval_confirmed().await.unwrap();
        let quote = session.request_quote(&params).await.unwrap();
        assert_eq!(quote.transaction.unwrap().to.as_deref(), Some("0xto"));

        session.submitted("0xhash").await.unwrap();
        let stage = session.receipt(ReceiptStatus::Success).await.unwrap();
        assert_eq!(stage.name(), "confirmed");
    }

    #[tokio::test]
    async fn test_upstream_error_surfaces() {
        let mut swap = MockSwapPort::new();
        swap.expect_get_price()
            .returning(|_| Err(SwapError::Upstream { status: 400, details: json!({ "name": "INPUT_INVALID" }) }));

        let session = SwapSession::new(Arc::new(swap));
        let err = session.request_price(SwapParams::default()).await.unwrap_err();
        assert!(matches!(err, SwapSessionError::Swap(SwapError::Upstream { status: 400, .. })));
        assert_eq!(session.stage().await, SwapStage::EnterAmount);
    }
}
