use std::{sync::Arc, time::Duration};

use alloy::{
    primitives::{Address, Bytes, I256},
    sol_types::SolCall,
};
use async_trait::async_trait;
use pairswap_common::{
    errors::PriceProviderError,
    models::{Decimal, PriceSource},
    planner::unix_now,
    traits::{ChainClient, FiatPriceProvider},
};
use tracing::{debug, instrument};

use crate::{abi::AggregatorV3Interface, config::OracleConfig, BigUintCodec};

/// Reads the base asset price from an on-chain aggregator exposing `latestRoundData`.
pub struct ChainlinkOracle {
    client: Arc<dyn ChainClient>,
    aggregator: Address,
    max_staleness: Option<Duration>,
}

impl ChainlinkOracle {
    pub fn new(client: Arc<dyn ChainClient>, config: &OracleConfig) -> Self {
        Self {
            client,
            aggregator: config.aggregator,
            max_staleness: config
                .max_staleness_secs
                .map(Duration::from_secs),
        }
    }

    async fn read<C: SolCall + Send>(&self, call: C) -> Result<C::Return, PriceProviderError> {
        let output = self
            .client
            .call(self.aggregator, Bytes::from(call.abi_encode()))
            .await?;
        C::abi_decode_returns(&output)
            .map_err(|e| PriceProviderError::Malformed(format!("{}: {e}", C::SIGNATURE)))
    }
}

#[async_trait]
impl FiatPriceProvider for ChainlinkOracle {
    fn source(&self) -> PriceSource {
        PriceSource::Oracle
    }

    #[instrument(skip(self), fields(aggregator = %self.aggregator))]
    async fn quote_fiat_price(&self) -> Result<Decimal, PriceProviderError> {
        let decimals = self
            .read(AggregatorV3Interface::decimalsCall {})
            .await?;
        let round = self
            .read(AggregatorV3Interface::latestRoundDataCall {})
            .await?;

        if round.answer <= I256::ZERO {
            return Err(PriceProviderError::NonPositive(round.answer.to_string()));
        }
        let updated_at = u64::try_from(round.updatedAt)
            .map_err(|_| PriceProviderError::Malformed(format!("updatedAt {}", round.updatedAt)))?;
        if updated_at == 0 {
            return Err(PriceProviderError::Malformed("round not complete".to_string()));
        }
        if let Some(max_staleness) = self.max_staleness {
            let age_secs = unix_now().saturating_sub(updated_at);
            if age_secs > max_staleness.as_secs() {
                return Err(PriceProviderError::Stale {
                    age_secs,
                    max_age_secs: max_staleness.as_secs(),
                });
            }
        }

        let price = Decimal::from_base_units(&round.answer.into_raw().to_biguint(), decimals);
        debug!(%price, updated_at, "Read oracle answer");
        Ok(price)
    }
}
