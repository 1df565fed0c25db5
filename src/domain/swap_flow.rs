//! Swap Flow
//!
//! State machine behind the swap screen:
//! enter amount -> indicative price -> (approve allowance) -> firm quote ->
//! review -> submit transaction -> await receipt.
//!
//! Only the fields of the aggregator responses that drive a transition are
//! modelled; the full payloads are proxied untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Indicative price, the subset of fields the flow needs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapPrice {
    #[serde(default)]
    pub buy_amount: Option<String>,
    #[serde(default)]
    pub sell_amount: Option<String>,
    #[serde(default)]
    pub issues: Option<PriceIssues>,
    #[serde(default)]
    pub liquidity_available: Option<bool>,
}

impl SwapPrice {
    /// Spender that needs an ERC-20 allowance before the swap, if any
    pub fn allowance_spender(&self) -> Option<&str> {
        self.issues
            .as_ref()
            .and_then(|i| i.allowance.as_ref())
            .and_then(|a| a.spender.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceIssues {
    #[serde(default)]
    pub allowance: Option<AllowanceIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllowanceIssue {
    #[serde(default)]
    pub actual: Option<String>,
    #[serde(default)]
    pub spender: Option<String>,
}

/// Firm quote with ready-to-sign transaction data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapQuote {
    #[serde(default)]
    pub buy_amount: Option<String>,
    #[serde(default)]
    pub sell_amount: Option<String>,
    #[serde(default)]
    pub transaction: Option<QuoteTransaction>,
    #[serde(default)]
    pub validation_errors: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteTransaction {
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub gas: Option<String>,
}

/// Why a quote cannot be reviewed
#[derive(Debug, Error, PartialEq)]
pub enum QuoteRejection {
    #[error("Quote validation failed ({0} errors)")]
    ValidationErrors(usize),
    #[error("Quote data is incomplete: missing {0}")]
    MissingField(&'static str),
}

impl SwapQuote {
    /// Check that the quote can be signed as-is
    pub fn check(&self) -> Result<(), QuoteRejection> {
        if !self.validation_errors.is_empty() {
            return Err(QuoteRejection::ValidationErrors(self.validation_errors.len()));
        }
        let tx = self.transaction.as_ref().ok_or(QuoteRejection::MissingField("transaction"))?;
        if tx.to.as_deref().map_or(true, str::is_empty) {
            return Err(QuoteRejection::MissingField("transaction.to"));
        }
        if tx.data.as_deref().map_or(true, str::is_empty) {
            return Err(QuoteRejection::MissingField("transaction.data"));
        }
        Ok(())
    }
}

/// Outcome of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Stage of the swap screen
#[derive(Debug, Clone, PartialEq)]
pub enum SwapStage {
    EnterAmount,
    PriceReady { price: SwapPrice },
    AwaitingApproval { price: SwapPrice, spender: String },
    Reviewing { quote: SwapQuote },
    Submitted { tx_hash: String },
    Confirmed { tx_hash: String },
    Failed { reason: String },
}

impl SwapStage {
    pub fn name(&self) -> &'static str {
        match self {
            SwapStage::EnterAmount => "enter_amount",
            SwapStage::PriceReady { .. } => "price_ready",
            SwapStage::AwaitingApproval { .. } => "awaiting_approval",
            SwapStage::Reviewing { .. } => "reviewing",
            SwapStage::Submitted { .. } => "submitted",
            SwapStage::Confirmed { .. } => "confirmed",
            SwapStage::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SwapFlowError {
    #[error("Cannot {action} while {stage}")]
    InvalidTransition { action: &'static str, stage: &'static str },
    #[error(transparent)]
    QuoteRejected(#[from] QuoteRejection),
}

/// Swap screen state machine
#[derive(Debug, Clone, PartialEq)]
pub struct SwapFlow {
    stage: SwapStage,
}

impl Default for SwapFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl SwapFlow {
    pub fn new() -> Self {
        Self { stage: SwapStage::EnterAmount }
    }

    pub fn stage(&self) -> &SwapStage {
        &self.stage
    }

    fn invalid(&self, action: &'static str) -> SwapFlowError {
        SwapFlowError::InvalidTransition { action, stage: self.stage.name() }
    }

    /// A new indicative price arrived for the current amount.
    ///
    /// Prices without a buy amount (no liquidity, zero amount) send the flow
    /// back to amount entry.
    pub fn price_received(&mut self, price: SwapPrice) -> Result<&SwapStage, SwapFlowError> {
        match self.stage {
            SwapStage::EnterAmount | SwapStage::PriceReady { .. } | SwapStage::AwaitingApproval { .. } => {}
            _ => return Err(self.invalid("update price")),
        }

        self.stage = match (price.buy_amount.is_some(), price.allowance_spender().map(str::to_string)) {
            (false, _) => SwapStage::EnterAmount,
            (true, Some(spender)) => SwapStage::AwaitingApproval { price, spender },
            (true, None) => SwapStage::PriceReady { price },
        };
        Ok(&self.stage)
    }

    /// The approval transaction for the spender was mined
    pub fn approval_confirmed(&mut self) -> Result<&SwapStage, SwapFlowError> {
        match std::mem::replace(&mut self.stage, SwapStage::EnterAmount) {
            SwapStage::AwaitingApproval { mut price, .. } => {
                price.issues = None;
                self.stage = SwapStage::PriceReady { price };
                Ok(&self.stage)
            }
            other => {
                self.stage = other;
                Err(self.invalid("confirm approval"))
            }
        }
    }

    /// A firm quote arrived; it must be signable to move to review
    pub fn quote_received(&mut self, quote: SwapQuote) -> Result<&SwapStage, SwapFlowError> {
        if !matches!(self.stage, SwapStage::PriceReady { .. }) {
            return Err(self.invalid("review quote"));
        }
        quote.check()?;
        self.stage = SwapStage::Reviewing { quote };
        Ok(&self.stage)
    }

    /// The reviewed transaction was handed to the wallet
    pub fn submitted(&mut self, tx_hash: impl Into<String>) -> Result<&SwapStage, SwapFlowError> {
        if !matches!(self.stage, SwapStage::Reviewing { .. }) {
            return Err(self.invalid("submit"));
        }
        self.stage = SwapStage::Submitted { tx_hash: tx_hash.into() };
        Ok(&self.stage)
    }

    /// Receipt for the submitted transaction
    pub fn receipt(&mut self, status: ReceiptStatus) -> Result<&SwapStage, SwapFlowError> {
        let SwapStage::Submitted { tx_hash } = &self.stage else {
            return Err(self.invalid("record receipt"));
        };
        self.stage = match status {
            ReceiptStatus::Success => SwapStage::Confirmed { tx_hash: tx_hash.clone() },
            ReceiptStatus::Reverted => SwapStage::Failed { reason: format!("Transaction {} reverted", tx_hash) },
        };
        Ok(&self.stage)
    }

    /// Wallet rejected or failed to send the transaction
    pub fn failed(&mut self, reason: impl Into<String>) -> &SwapStage {
        self.stage = SwapStage::Failed { reason: reason.into() };
        &self.stage
    }

    /// Back to amount entry, e.g. after closing the review or a finished swap
    pub fn reset(&mut self) {
        self.stage = SwapStage::EnterAmount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn price(spender: Option<&str>) -> SwapPrice {
        serde_json::from_value(serde_json::json!({
            "buyAmount": "1000000",
            "sellAmount": "500000000000000000",
            "liquidityAvailable": true,
            "issues": { "allowance": spender.map(|s| serde_json::json!({ "actual": "0", "spender": s })) }
        }))
        .unwrap()
    }

    fn quote() -> SwapQuote {
        serde_json::from_value(serde_json::json!({
            "buyAmount": "1000000",
            "transaction": { "to": "0xdef1", "data": "0xabcdef", "value": "0", "gas": "210000" }
        }))
        .unwrap()
    }

    #[test]
    fn test_happy_path_with_approval() {
        let mut flow = SwapFlow::new();

        let stage = flow.price_received(price(Some("0xspender"))).unwrap();
        assert!(matches!(stage, SwapStage::AwaitingApproval { spender, .. } if spender == "0xspender"));

        // Reviewing before approval is not allowed
        assert!(flow.quote_received(quote()).is_err());

        assert_eq!(flow.approval_confirmed().unwrap().name(), "price_ready");
        assert_eq!(flow.quote_received(quote()).unwrap().name(), "reviewing");
        assert_eq!(flow.submitted("0xhash").unwrap().name(), "submitted");
        assert_eq!(
            flow.receipt(ReceiptStatus::Success).unwrap(),
            &SwapStage::Confirmed { tx_hash: "0xhash".into() }
        );
    }

    #[test]
    fn test_native_sell_skips_approval() {
        let mut flow = SwapFlow::new();
        assert_eq!(flow.price_received(price(None)).unwrap().name(), "price_ready");
    }

    #[test]
    fn test_price_without_buy_amount_resets() {
        let mut flow = SwapFlow::new();
        flow.price_received(price(None)).unwrap();
        flow.price_received(SwapPrice::default()).unwrap();
        assert_eq!(flow.stage(), &SwapStage::EnterAmount);
    }

    #[test]
    fn test_incomplete_quote_rejected() {
        let mut flow = SwapFlow::new();
        flow.price_received(price(None)).unwrap();

        let mut q = quote();
        q.transaction.as_mut().unwrap().data = None;
        assert_eq!(
            flow.quote_received(q),
            Err(SwapFlowError::QuoteRejected(QuoteRejection::MissingField("transaction.data")))
        );
        assert_eq!(flow.stage().name(), "price_ready");
    }

    #[test]
    fn test_quote_with_validation_errors_rejected() {
        let q: SwapQuote = serde_json::from_value(serde_json::json!({
            "validationErrors": [{ "field": "sellAmount", "reason": "too small" }]
        }))
        .unwrap();
        assert_eq!(q.check(), Err(QuoteRejection::ValidationErrors(1)));
    }

    #[test]
    fn test_reverted_receipt_fails() {
        let mut flow = SwapFlow::new();
        flow.price_received(price(None)).unwrap();
        flow.quote_received(quote()).unwrap();
        flow.submitted("0xdead").unwrap();
        let stage = flow.receipt(ReceiptStatus::Reverted).unwrap();
        assert!(matches!(stage, SwapStage::Failed { .. }));
    }

    #[test]
    fn test_approval_outside_awaiting_is_rejected() {
        let mut flow = SwapFlow::new();
        assert!(matches!(
            flow.approval_confirmed(),
            Err(SwapFlowError::InvalidTransition { stage: "enter_amount", .. })
        ));
        assert_eq!(flow.stage(), &SwapStage::EnterAmount);
    }
}
