use std::fmt;

use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};

use crate::models::Amount;

/// Buy spends the base asset to receive the token, Sell spends the token to receive the base
/// asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    Buy,
    Sell,
}

impl fmt::Display for SwapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwapDirection::Buy => write!(f, "buy"),
            SwapDirection::Sell => write!(f, "sell"),
        }
    }
}

/// A caller's intent to swap. `token_address` is validated by the executor before any network
/// call is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub direction: SwapDirection,
    pub token_address: String,
    pub amount_in: Amount,
    /// Slippage tolerance in basis points, must be below 10000.
    pub slippage_bps: u16,
}

impl SwapRequest {
    pub fn new(
        direction: SwapDirection,
        token_address: impl Into<String>,
        amount_in: Amount,
        slippage_bps: u16,
    ) -> Self {
        Self { direction, token_address: token_address.into(), amount_in, slippage_bps }
    }

    pub fn buy(token_address: impl Into<String>, amount_in: Amount, slippage_bps: u16) -> Self {
        Self::new(SwapDirection::Buy, token_address, amount_in, slippage_bps)
    }

    pub fn sell(token_address: impl Into<String>, amount_in: Amount, slippage_bps: u16) -> Self {
        Self::new(SwapDirection::Sell, token_address, amount_in, slippage_bps)
    }
}

/// The bounded swap that will be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapPlan {
    pub amount_in: Amount,
    pub expected_out: Amount,
    /// `floor(expected_out * (10000 - slippage_bps) / 10000)`
    pub min_out: Amount,
    pub path: Vec<Address>,
    pub slippage_bps: u16,
    /// Unix timestamp in seconds after which the router rejects the swap.
    pub deadline: u64,
}

impl SwapPlan {
    pub fn is_expired_at(&self, unix_secs: u64) -> bool {
        unix_secs >= self.deadline
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapStatus {
    /// Broadcast but not (yet) observed as confirmed.
    Submitted,
    Confirmed,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub tx_hash: TxHash,
    /// Output observed in the receipt, if it could be attributed.
    pub confirmed_amount_out: Option<Amount>,
    pub status: SwapStatus,
    /// Hash of the approval sent ahead of the swap, if one was needed.
    pub approval_tx_hash: Option<TxHash>,
}

impl SwapOutcome {
    pub fn submitted(tx_hash: TxHash, approval_tx_hash: Option<TxHash>) -> Self {
        Self { tx_hash, confirmed_amount_out: None, status: SwapStatus::Submitted, approval_tx_hash }
    }

    pub fn confirmed(
        tx_hash: TxHash,
        confirmed_amount_out: Option<Amount>,
        approval_tx_hash: Option<TxHash>,
    ) -> Self {
        Self { tx_hash, confirmed_amount_out, status: SwapStatus::Confirmed, approval_tx_hash }
    }

    pub fn reverted(tx_hash: TxHash) -> Self {
        Self {
            tx_hash,
            confirmed_amount_out: None,
            status: SwapStatus::Reverted,
            approval_tx_hash: None,
        }
    }
}
