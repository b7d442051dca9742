use std::fmt;

use alloy_primitives::Address;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
    errors::SwapError,
    models::{Amount, Decimal},
};

/// Minimal token description needed to interpret on-chain integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenInfo {
    pub address: Address,
    pub decimals: u8,
}

impl TokenInfo {
    pub fn new(address: Address, decimals: u8) -> Self {
        Self { address, decimals }
    }
}

/// Reserves of a pair, already mapped to the asset being priced and its counter asset.
///
/// Built fresh for every request since reserves change every block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveSnapshot {
    pub asset_reserve: Amount,
    pub counter_reserve: Amount,
    pub pair_address: Address,
    pub is_asset_token0: bool,
}

impl ReserveSnapshot {
    /// Maps the raw pair slots onto asset and counter asset.
    ///
    /// The pair stores its reserves in address order, so slot 0 holds whichever token has the
    /// lower address. Returns `None` if `token0` is neither of the two tokens.
    pub fn from_slots(
        pair_address: Address,
        token0: Address,
        reserve0: BigUint,
        reserve1: BigUint,
        asset: &TokenInfo,
        counter: &TokenInfo,
    ) -> Option<Self> {
        let (asset_raw, counter_raw, is_asset_token0) = if token0 == asset.address {
            (reserve0, reserve1, true)
        } else if token0 == counter.address {
            (reserve1, reserve0, false)
        } else {
            return None;
        };

        Some(Self {
            asset_reserve: Amount::new(asset_raw, asset.decimals),
            counter_reserve: Amount::new(counter_raw, counter.decimals),
            pair_address,
            is_asset_token0,
        })
    }

    /// Spot price of one asset unit in counter units.
    ///
    /// Both reserves are converted to human units before taking the ratio, since the two tokens
    /// may use different precision. `None` if the asset reserve is empty.
    pub fn price_in_base(&self) -> Option<Decimal> {
        self.counter_reserve
            .to_decimal()
            .checked_div(&self.asset_reserve.to_decimal())
    }
}

/// Which provider satisfied a fiat price request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Oracle,
    FallbackFeed,
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceSource::Oracle => write!(f, "oracle"),
            PriceSource::FallbackFeed => write!(f, "fallback_feed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub price_in_base: Decimal,
    pub price_in_fiat: Decimal,
    pub source: PriceSource,
}

impl PriceQuote {
    /// Quote for the base asset itself, whose price in base is one by definition.
    pub fn for_base_asset(price_in_fiat: Decimal, source: PriceSource) -> Self {
        Self { price_in_base: Decimal::one(), price_in_fiat, source }
    }
}

/// Market figures for a token, derived from a single reserve snapshot. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStats {
    pub price_in_base: Decimal,
    pub price_in_fiat: Decimal,
    pub market_cap_fiat: Decimal,
    pub liquidity_fiat: Decimal,
    pub total_supply: Amount,
    pub pair_address: Address,
    pub price_source: PriceSource,
    pub reserves: ReserveSnapshot,
}

impl MarketStats {
    /// Combines a reserve snapshot, the token supply and the base asset's fiat price.
    ///
    /// Liquidity values only the counter side and doubles it, which matches the pool value at
    /// equilibrium.
    pub fn from_parts(
        reserves: ReserveSnapshot,
        total_supply: Amount,
        base_quote: &PriceQuote,
    ) -> Result<Self, SwapError> {
        let price_in_base = reserves.price_in_base().ok_or_else(|| {
            SwapError::StatsUnavailable(Box::new(SwapError::InvalidAmount(format!(
                "pair {} has an empty asset reserve",
                reserves.pair_address
            ))))
        })?;
        let base_fiat = &base_quote.price_in_fiat;

        let price_in_fiat = &price_in_base * base_fiat;
        let market_cap_fiat = &price_in_fiat * &total_supply.to_decimal();
        let liquidity_fiat =
            &(&reserves.counter_reserve.to_decimal() * base_fiat) * &Decimal::from(2u64);

        Ok(Self {
            price_in_base,
            price_in_fiat,
            market_cap_fiat,
            liquidity_fiat,
            total_supply,
            pair_address: reserves.pair_address,
            price_source: base_quote.source,
            reserves,
        })
    }

    /// The token's own price quote, attributed to the provider that priced the base asset.
    pub fn quote(&self) -> PriceQuote {
        PriceQuote {
            price_in_base: self.price_in_base.clone(),
            price_in_fiat: self.price_in_fiat.clone(),
            source: self.price_source,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;
    use pretty_assertions::assert_eq;

    use super::*;

    const PAIR: Address = address!("0xB4e16d0168e52d35CaCD2c6185b44281Ec28C9Dc");
    const TOKEN: Address = address!("0x6982508145454Ce325dDbE47a25d4ec3d2311933");
    const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

    fn units(whole: u64, decimals: u8) -> BigUint {
        BigUint::from(whole) * BigUint::from(10u32).pow(u32::from(decimals))
    }

    #[test]
    fn test_token_ordering_does_not_change_price() {
        let asset = TokenInfo::new(TOKEN, 18);
        let counter = TokenInfo::new(WETH, 18);

        let as_token0 =
            ReserveSnapshot::from_slots(PAIR, TOKEN, units(100, 18), units(10, 18), &asset, &counter)
                .unwrap();
        let as_token1 =
            ReserveSnapshot::from_slots(PAIR, WETH, units(10, 18), units(100, 18), &asset, &counter)
                .unwrap();

        assert!(as_token0.is_asset_token0);
        assert!(!as_token1.is_asset_token0);
        assert_eq!(as_token0.asset_reserve, as_token1.asset_reserve);
        assert_eq!(as_token0.price_in_base(), as_token1.price_in_base());
        assert_eq!(as_token0.price_in_base().unwrap(), "0.1".parse().unwrap());
    }

    #[test]
    fn test_price_with_mixed_decimals() {
        // 2000 USDC-like tokens (6 dp) against 1 base unit (18 dp)
        let asset = TokenInfo::new(TOKEN, 6);
        let counter = TokenInfo::new(WETH, 18);
        let snapshot =
            ReserveSnapshot::from_slots(PAIR, WETH, units(1, 18), units(2000, 6), &asset, &counter)
                .unwrap();

        assert_eq!(snapshot.price_in_base().unwrap(), "0.0005".parse().unwrap());
    }

    #[test]
    fn test_unknown_token0() {
        let asset = TokenInfo::new(TOKEN, 18);
        let counter = TokenInfo::new(WETH, 18);
        let snapshot =
            ReserveSnapshot::from_slots(PAIR, PAIR, units(1, 18), units(1, 18), &asset, &counter);
        assert!(snapshot.is_none());
    }

    #[test]
    fn test_market_stats_from_parts() {
        let asset = TokenInfo::new(TOKEN, 18);
        let counter = TokenInfo::new(WETH, 18);
        let reserves =
            ReserveSnapshot::from_slots(PAIR, TOKEN, units(100, 18), units(10, 18), &asset, &counter)
                .unwrap();
        let supply = Amount::new(units(1_000_000, 18), 18);
        let base_quote = PriceQuote::for_base_asset(Decimal::from(300u64), PriceSource::Oracle);

        let stats = MarketStats::from_parts(reserves, supply, &base_quote).unwrap();

        assert_eq!(stats.price_in_base.to_string(), "0.1");
        assert_eq!(stats.price_in_fiat.to_string(), "30");
        assert_eq!(stats.liquidity_fiat.to_string(), "6000");
        assert_eq!(stats.market_cap_fiat.to_string(), "30000000");
        assert_eq!(stats.pair_address, PAIR);
        assert_eq!(stats.quote().source, PriceSource::Oracle);
    }

    #[test]
    fn test_market_stats_empty_reserve() {
        let asset = TokenInfo::new(TOKEN, 18);
        let counter = TokenInfo::new(WETH, 18);
        let reserves = ReserveSnapshot::from_slots(
            PAIR,
            TOKEN,
            BigUint::from(0u32),
            units(10, 18),
            &asset,
            &counter,
        )
        .unwrap();
        let base_quote = PriceQuote::for_base_asset(Decimal::from(300u64), PriceSource::Oracle);

        let res = MarketStats::from_parts(reserves, Amount::zero(18), &base_quote);
        assert!(matches!(res, Err(SwapError::StatsUnavailable(_))));
    }
}
