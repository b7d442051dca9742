use std::fmt;

use alloy_primitives::{Address, TxHash};
use num_bigint::BigUint;
use thiserror::Error;

use crate::{
    display::DisplayOption,
    models::{PriceSource, SwapOutcome},
};

/// Failures reported by the chain client collaborator.
///
/// Variants:
/// - `Transport`: the node could not be reached or the request timed out. Retrying later may
///   succeed.
/// - `Rejected`: the node refused the request, e.g. a failed `eth_call` or an invalid
///   transaction.
/// - `Unknown`: anything else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Rejected by node: {0}")]
    Rejected(String),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ChainError {
    pub fn should_retry(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Failure of a single fiat price provider. These are absorbed by the provider chain until every
/// provider has been tried.
#[derive(Error, Debug)]
pub enum PriceProviderError {
    #[error("Price request failed: {0}")]
    Request(String),
    #[error("Malformed price response: {0}")]
    Malformed(String),
    #[error("Non-positive price reported: {0}")]
    NonPositive(String),
    #[error("Stale price: updated {age_secs}s ago, limit is {max_age_secs}s")]
    Stale { age_secs: u64, max_age_secs: u64 },
    #[error("Oracle read failed: {0}")]
    Rpc(#[from] ChainError),
}

/// One failed attempt within the price provider chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceAttempt {
    pub source: PriceSource,
    pub error: String,
}

impl fmt::Display for PriceAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

fn format_attempts(attempts: &[PriceAttempt]) -> String {
    if attempts.is_empty() {
        return "no providers configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why an on-chain swap or approval was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevertKind {
    /// The output fell below the minimum bound.
    SlippageExceeded,
    /// The deadline passed before the transaction was mined.
    Expired,
    InsufficientBalance,
    InsufficientAllowance,
    Unknown,
}

/// A decoded revert, keeping the original message for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertReason {
    pub kind: RevertKind,
    pub message: Option<String>,
}

impl RevertReason {
    /// Classifies a revert message emitted by the router, pair or token contracts.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let upper = message.to_ascii_uppercase();
        let kind = if upper.contains("INSUFFICIENT_OUTPUT_AMOUNT") ||
            upper.contains("INSUFFICIENT OUTPUT AMOUNT")
        {
            RevertKind::SlippageExceeded
        } else if upper.contains("EXPIRED") {
            RevertKind::Expired
        } else if upper.contains("ALLOWANCE") {
            RevertKind::InsufficientAllowance
        } else if upper.contains("TRANSFER_FROM_FAILED") ||
            upper.contains("EXCEEDS BALANCE") ||
            upper.contains("INSUFFICIENT BALANCE") ||
            upper.contains("INSUFFICIENT_INPUT_AMOUNT") ||
            upper.contains("ETH_TRANSFER_FAILED")
        {
            RevertKind::InsufficientBalance
        } else {
            RevertKind::Unknown
        };
        Self { kind, message: Some(message) }
    }

    /// A revert whose output could not be decoded.
    pub fn unknown() -> Self {
        Self { kind: RevertKind::Unknown, message: None }
    }
}

impl fmt::Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.message) {
            (_, Some(message)) => write!(f, "{message} ({:?})", self.kind),
            (kind, None) => write!(f, "{kind:?}"),
        }
    }
}

/// Outer-level, user facing errors of the swap and stats engine.
///
/// Validation variants (`InvalidAmount`, `InvalidAddress`, `InvalidSlippage`) are raised before
/// any network call. `SwapReverted` and `Expired` carry the transaction hash when a transaction
/// was actually mined, so the caller can distinguish a bad slippage bound from missing funds
/// from an unknown revert.
#[derive(Error, Debug)]
pub enum SwapError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid slippage: {0} bps, must be below 10000")]
    InvalidSlippage(u16),
    #[error("No pair found for {token_a} / {token_b}")]
    PairNotFound { token_a: Address, token_b: Address },
    #[error("RPC error: {0}")]
    Rpc(#[from] ChainError),
    #[error("Price unavailable, all providers failed: {}", format_attempts(.0))]
    PriceUnavailable(Vec<PriceAttempt>),
    #[error("Market stats unavailable: {0}")]
    StatsUnavailable(#[source] Box<SwapError>),
    #[error("Insufficient allowance: {allowance} approved, {required} required")]
    InsufficientAllowance { allowance: BigUint, required: BigUint },
    #[error("Insufficient balance: {balance} held, {required} required")]
    InsufficientBalance { balance: BigUint, required: BigUint },
    #[error("Approval transaction {tx_hash} reverted: {}", DisplayOption(.reason))]
    ApprovalReverted { tx_hash: TxHash, reason: Option<RevertReason> },
    #[error("Swap transaction {tx_hash} reverted: {}", DisplayOption(.reason))]
    SwapReverted { tx_hash: TxHash, reason: Option<RevertReason> },
    #[error("Swap deadline {deadline} passed (tx: {})", DisplayOption(.tx_hash))]
    Expired { deadline: u64, tx_hash: Option<TxHash> },
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SwapError {
    /// Only transport failures are worth retrying, and never inside this crate.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Rpc(err) => err.should_retry(),
            Self::StatsUnavailable(inner) => inner.is_retryable(),
            _ => false,
        }
    }

    /// The outcome record for errors that happened after a swap transaction was mined.
    pub fn outcome(&self) -> Option<SwapOutcome> {
        match self {
            Self::SwapReverted { tx_hash, .. } => Some(SwapOutcome::reverted(*tx_hash)),
            Self::Expired { tx_hash: Some(tx_hash), .. } => Some(SwapOutcome::reverted(*tx_hash)),
            _ => None,
        }
    }
}
