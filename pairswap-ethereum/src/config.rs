use std::time::Duration;

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Contract addresses and submission settings of the exchange deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DexConfig {
    /// Router used for quotes and swaps; also the spender approved for sells.
    pub router: Address,
    /// Factory used to resolve pair addresses.
    pub factory: Address,
    /// Wrapped form of the base asset, one side of every pair.
    pub wrapped_native: Address,
    /// Decimals of the base asset (default: 18)
    pub native_decimals: u8,
    /// Seconds a swap stays executable after planning (default: 600)
    pub deadline_window_secs: u64,
    /// Confirmations to wait for on approvals and swaps (default: 1)
    pub confirmations: u64,
}

impl DexConfig {
    pub fn new(router: Address, factory: Address, wrapped_native: Address) -> Self {
        Self { router, factory, wrapped_native, ..Self::uniswap_v2_mainnet() }
    }

    /// The canonical Uniswap V2 deployment on Ethereum mainnet.
    pub fn uniswap_v2_mainnet() -> Self {
        Self {
            router: address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
            factory: address!("5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f"),
            wrapped_native: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            native_decimals: 18,
            deadline_window_secs: 600,
            confirmations: 1,
        }
    }

    pub fn deadline_window(&self) -> Duration {
        Duration::from_secs(self.deadline_window_secs)
    }
}

impl Default for DexConfig {
    fn default() -> Self {
        Self::uniswap_v2_mainnet()
    }
}

/// Settings for the on-chain price aggregator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub aggregator: Address,
    /// Answers older than this are rejected. `None` accepts any age.
    pub max_staleness_secs: Option<u64>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        // ETH / USD on mainnet
        Self {
            aggregator: address!("5f4eC3Df9cbd43714FE2740f5E3616155c5b8419"),
            max_staleness_secs: Some(3600),
        }
    }
}

/// Settings for the HTTP price feed used when the oracle fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceFeedConfig {
    pub base_url: String,
    /// Identifier of the base asset in the feed, e.g. `ethereum`.
    pub asset_id: String,
    /// Fiat currency code as understood by the feed (default: usd)
    pub currency: String,
    /// Request timeout in milliseconds (default: 5000ms)
    pub timeout_ms: u64,
}

impl PriceFeedConfig {
    pub fn new(base_url: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), asset_id: asset_id.into(), ..Default::default() }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            asset_id: "ethereum".to_string(),
            currency: "usd".to_string(),
            timeout_ms: 5000,
        }
    }
}
