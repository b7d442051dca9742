use std::sync::Arc;

use alloy::primitives::{Address, U256};
use pairswap_common::{
    errors::SwapError,
    models::{ReserveSnapshot, TokenInfo},
    traits::ChainClient,
};
use tracing::{debug, instrument};

use crate::{
    abi::{read, IUniswapV2Factory, IUniswapV2Pair},
    BigUintCodec,
};

/// Reads pair addresses and pool reserves.
pub struct ReserveReader {
    client: Arc<dyn ChainClient>,
}

impl ReserveReader {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Looks up the pair contract for two tokens. The order of the tokens does not matter.
    #[instrument(level = "debug", skip(self))]
    pub async fn resolve_pair(
        &self,
        factory: Address,
        token_a: Address,
        token_b: Address,
    ) -> Result<Address, SwapError> {
        let pair = read(
            self.client.as_ref(),
            factory,
            IUniswapV2Factory::getPairCall { tokenA: token_a, tokenB: token_b },
        )
        .await?;
        if pair.is_zero() {
            return Err(SwapError::PairNotFound { token_a, token_b });
        }
        debug!(%pair, "Resolved pair");
        Ok(pair)
    }

    /// Reads both reserve slots and orients them by the pair's `token0`.
    ///
    /// An empty pool is not an error; the snapshot simply carries zero reserves.
    #[instrument(level = "debug", skip(self))]
    pub async fn read(
        &self,
        pair: Address,
        asset: &TokenInfo,
        counter: &TokenInfo,
    ) -> Result<ReserveSnapshot, SwapError> {
        let token0 = read(self.client.as_ref(), pair, IUniswapV2Pair::token0Call {}).await?;
        let reserves = read(self.client.as_ref(), pair, IUniswapV2Pair::getReservesCall {}).await?;
        let reserve0 = U256::from(reserves.reserve0).to_biguint();
        let reserve1 = U256::from(reserves.reserve1).to_biguint();
        debug!(%token0, %reserve0, %reserve1, "Read pair reserves");

        // token0 matching neither side means the pair does not trade this asset
        ReserveSnapshot::from_slots(pair, token0, reserve0, reserve1, asset, counter).ok_or(
            SwapError::PairNotFound { token_a: asset.address, token_b: counter.address },
        )
    }
}
