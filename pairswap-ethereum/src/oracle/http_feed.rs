use std::str::FromStr;

use async_trait::async_trait;
use pairswap_common::{
    errors::PriceProviderError,
    models::{Decimal, PriceSource},
    traits::FiatPriceProvider,
};
use reqwest::{header, Client, ClientBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::config::PriceFeedConfig;

/// Fallback fiat price from a public HTTP price API.
///
/// Issues `GET {base_url}/simple/price?ids={asset_id}&vs_currencies={currency}` and expects a
/// body of the form `{"ethereum": {"usd": 3012.5}}`.
#[derive(Debug, Clone)]
pub struct HttpPriceFeed {
    http_client: Client,
    url: Url,
    asset_id: String,
    currency: String,
}

impl HttpPriceFeed {
    pub fn new(config: &PriceFeedConfig) -> Result<Self, PriceProviderError> {
        let endpoint = format!("{}/simple/price", config.base_url.trim_end_matches('/'));
        let url = Url::parse(&endpoint)
            .map_err(|e| PriceProviderError::Request(format!("invalid url {endpoint}: {e}")))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        let user_agent = format!("pairswap-{version}", version = env!("CARGO_PKG_VERSION"));
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_str(&user_agent)
                .map_err(|e| PriceProviderError::Request(format!("invalid user agent: {e}")))?,
        );

        let http_client = ClientBuilder::new()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| PriceProviderError::Request(e.to_string()))?;

        Ok(Self {
            http_client,
            url,
            asset_id: config.asset_id.clone(),
            currency: config.currency.to_ascii_lowercase(),
        })
    }

    fn extract_price(&self, body: &str) -> Result<Decimal, PriceProviderError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| PriceProviderError::Malformed(format!("invalid json: {e}")))?;
        let number = value
            .get(&self.asset_id)
            .and_then(|asset| asset.get(&self.currency))
            .ok_or_else(|| {
                PriceProviderError::Malformed(format!(
                    "missing {}.{} in response",
                    self.asset_id, self.currency
                ))
            })?;
        let Value::Number(number) = number else {
            return Err(PriceProviderError::Malformed(format!("price is not a number: {number}")));
        };

        let literal = number.to_string();
        if literal.starts_with('-') {
            return Err(PriceProviderError::NonPositive(literal));
        }
        let price = Decimal::from_str(&literal)
            .map_err(|e| PriceProviderError::Malformed(format!("{literal}: {e}")))?;
        if price.is_zero() {
            return Err(PriceProviderError::NonPositive(literal));
        }
        Ok(price)
    }
}

#[async_trait]
impl FiatPriceProvider for HttpPriceFeed {
    fn source(&self) -> PriceSource {
        PriceSource::FallbackFeed
    }

    #[instrument(skip(self), fields(url = %self.url, asset = %self.asset_id))]
    async fn quote_fiat_price(&self) -> Result<Decimal, PriceProviderError> {
        let response = self
            .http_client
            .get(self.url.clone())
            .query(&[("ids", self.asset_id.as_str()), ("vs_currencies", self.currency.as_str())])
            .send()
            .await
            .map_err(|e| PriceProviderError::Request(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PriceProviderError::Request(format!("HTTP {}", status.as_u16())));
        }
        let body = response
            .text()
            .await
            .map_err(|e| PriceProviderError::Request(e.to_string()))?;

        let price = self.extract_price(&body)?;
        debug!(%price, "Read feed price");
        Ok(price)
    }
}
