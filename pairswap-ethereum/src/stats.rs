use std::sync::Arc;

use alloy::primitives::Address;
use pairswap_common::{
    errors::SwapError,
    models::{Amount, MarketStats, TokenInfo},
    traits::ChainClient,
};
use tracing::{info, instrument, warn};

use crate::{
    abi::{read, IERC20},
    config::DexConfig,
    oracle::PriceOracleChain,
    parse_address,
    reserves::ReserveReader,
    BigUintCodec,
};

/// Combines pool reserves, token supply and the base asset's fiat price into market figures.
pub struct MarketStatsAggregator {
    client: Arc<dyn ChainClient>,
    reserves: ReserveReader,
    oracle: PriceOracleChain,
    factory: Address,
    wrapped_native: Address,
}

impl MarketStatsAggregator {
    pub fn new(client: Arc<dyn ChainClient>, config: &DexConfig, oracle: PriceOracleChain) -> Self {
        Self {
            reserves: ReserveReader::new(client.clone()),
            client,
            oracle,
            factory: config.factory,
            wrapped_native: config.wrapped_native,
        }
    }

    /// Computes price, market cap and liquidity for `token_address` against the wrapped base
    /// asset.
    ///
    /// `InvalidAddress` and `PairNotFound` are returned as is. Any other failure, including an
    /// exhausted price chain or an empty pool, is reported as `StatsUnavailable` wrapping the
    /// cause, so callers can tell "no such market" apart from "market exists but cannot be
    /// priced right now".
    #[instrument(skip(self))]
    pub async fn compute_stats(&self, token_address: &str) -> Result<MarketStats, SwapError> {
        let token = parse_address(token_address)?;
        let result = self.compute(token).await;
        match result {
            Ok(stats) => {
                info!(
                    pair = %stats.pair_address,
                    price_in_base = %stats.price_in_base,
                    price_in_fiat = %stats.price_in_fiat,
                    source = %stats.price_source,
                    "Computed market stats"
                );
                Ok(stats)
            }
            Err(err @ (SwapError::PairNotFound { .. } | SwapError::InvalidAddress(_))) => Err(err),
            Err(err @ SwapError::StatsUnavailable(_)) => Err(err),
            Err(err) => {
                warn!(error = %err, "Market stats unavailable");
                Err(SwapError::StatsUnavailable(Box::new(err)))
            }
        }
    }

    async fn compute(&self, token: Address) -> Result<MarketStats, SwapError> {
        let pair = self
            .reserves
            .resolve_pair(self.factory, token, self.wrapped_native)
            .await?;

        let client = self.client.as_ref();
        let token_decimals = read(client, token, IERC20::decimalsCall {}).await?;
        let native_decimals = read(client, self.wrapped_native, IERC20::decimalsCall {}).await?;
        let total_supply = read(client, token, IERC20::totalSupplyCall {}).await?;

        let asset = TokenInfo::new(token, token_decimals);
        let counter = TokenInfo::new(self.wrapped_native, native_decimals);
        let (reserves, base_quote) = futures03::join!(
            self.reserves.read(pair, &asset, &counter),
            self.oracle.fiat_price_of_base()
        );

        MarketStats::from_parts(
            reserves?,
            Amount::new(total_supply.to_biguint(), token_decimals),
            &base_quote?,
        )
    }
}
