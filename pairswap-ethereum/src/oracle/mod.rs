//! Fiat pricing of the base asset with an ordered list of fallback providers.

pub mod chainlink;
pub mod http_feed;

pub use chainlink::ChainlinkOracle;
pub use http_feed::HttpPriceFeed;
use pairswap_common::{
    errors::{PriceAttempt, SwapError},
    models::PriceQuote,
    traits::FiatPriceProvider,
};
use tracing::{debug, instrument, warn};

/// Tries each provider once, in order, and returns the first valid price.
///
/// Typically configured with a [`ChainlinkOracle`] followed by an [`HttpPriceFeed`]. Retries are
/// left to the providers' callers; a failing provider is never asked twice for the same request.
pub struct PriceOracleChain {
    providers: Vec<Box<dyn FiatPriceProvider>>,
}

impl PriceOracleChain {
    pub fn new(providers: Vec<Box<dyn FiatPriceProvider>>) -> Self {
        Self { providers }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Fiat price of one whole unit of the base asset.
    ///
    /// Fails with [`SwapError::PriceUnavailable`] listing every failed attempt, in order, once
    /// all providers have been exhausted.
    #[instrument(skip(self), fields(providers = self.providers.len()))]
    pub async fn fiat_price_of_base(&self) -> Result<PriceQuote, SwapError> {
        let mut attempts = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let source = provider.source();
            match provider.quote_fiat_price().await {
                Ok(price) if !price.is_zero() => {
                    debug!(%source, %price, "Priced base asset");
                    return Ok(PriceQuote::for_base_asset(price, source));
                }
                Ok(_) => {
                    warn!(%source, "Price provider reported zero, trying next");
                    attempts.push(PriceAttempt { source, error: "zero price".to_string() });
                }
                Err(err) => {
                    warn!(%source, error = %err, "Price provider failed, trying next");
                    attempts.push(PriceAttempt { source, error: err.to_string() });
                }
            }
        }
        Err(SwapError::PriceUnavailable(attempts))
    }
}
