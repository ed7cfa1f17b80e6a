//! Polymarket client implementing the agent's market-data and execution seams

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info, instrument};

use super::rest::PolymarketRestClient;
use crate::common::errors::{AgentError, Result};
use crate::common::traits::{MarketDataSource, OrderExecutor};
use crate::common::types::{order_size, MarketPrices, OrderRequest, TradeType};
use crate::config::types::{ApiCredentials, AppConfig};

/// Lowest limit price the CLOB accepts
pub const MIN_LIMIT_PRICE: Decimal = dec!(0.01);
/// Highest limit price the CLOB accepts
pub const MAX_LIMIT_PRICE: Decimal = dec!(0.99);

/// Gamma prices in, CLOB orders out
#[derive(Debug, Clone)]
pub struct PolymarketClient {
    rest_client: PolymarketRestClient,
    /// Slippage tolerance in percent applied to order limit prices
    max_slippage_percent: Decimal,
}

impl PolymarketClient {
    pub fn new(rest_client: PolymarketRestClient, max_slippage_percent: Decimal) -> Self {
        Self {
            rest_client,
            max_slippage_percent,
        }
    }

    /// Build from the application configuration
    ///
    /// Credentials are attached when all three are configured.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let rest_client = PolymarketRestClient::with_timeout(
            &config.market.clob_url,
            &config.market.gamma_url,
            config.settings.request_timeout(),
        )?;

        let rest_client = match ApiCredentials::from_wallet(&config.wallet) {
            Some(creds) => rest_client.with_credentials(creds),
            None => rest_client,
        };

        Ok(Self::new(rest_client, config.wallet.max_slippage_percent))
    }

    /// Get a reference to the REST client
    pub fn rest(&self) -> &PolymarketRestClient {
        &self.rest_client
    }

    /// Limit price with the slippage tolerance applied
    ///
    /// Buys may pay up to the tolerance more, sells accept up to the
    /// tolerance less. Clamped to the CLOB's tradable range.
    pub fn limit_price(&self, price: Decimal, trade_type: TradeType) -> Decimal {
        let slippage = self.max_slippage_percent / Decimal::ONE_HUNDRED;
        let adjusted = match trade_type {
            TradeType::Buy => price * (Decimal::ONE + slippage),
            TradeType::Sell => price * (Decimal::ONE - slippage),
        };
        adjusted.clamp(MIN_LIMIT_PRICE, MAX_LIMIT_PRICE)
    }
}

#[async_trait]
impl MarketDataSource for PolymarketClient {
    #[instrument(skip(self))]
    async fn fetch_current_prices(&self, market_id: &str) -> Result<MarketPrices> {
        let market = self.rest_client.get_gamma_market(market_id).await?;
        let (yes_price, no_price) = PolymarketRestClient::outcome_prices(&market)?;
        debug!(%yes_price, %no_price, "Fetched outcome prices");
        MarketPrices::new(yes_price, no_price)
    }

    fn source_name(&self) -> &'static str {
        "Polymarket Gamma"
    }
}

#[async_trait]
impl OrderExecutor for PolymarketClient {
    #[instrument(skip(self), fields(side = %order.side, trade_type = %order.trade_type))]
    async fn place_order(&self, order: &OrderRequest) -> Result<String> {
        let limit = self.limit_price(order.price, order.trade_type);
        let request = OrderRequest {
            price: limit.round_dp(4),
            size: order_size(order.size),
            ..order.clone()
        };
        if request.size <= Decimal::ZERO {
            return Err(AgentError::InvalidArgument(format!(
                "order size {} rounds to zero",
                order.size
            )));
        }

        info!(
            size = %request.size,
            quoted = %order.price,
            limit = %request.price,
            "Placing order"
        );
        self.rest_client.post_order(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(slippage: Decimal) -> PolymarketClient {
        let rest = PolymarketRestClient::new("http://localhost", "http://localhost").unwrap();
        PolymarketClient::new(rest, slippage)
    }

    #[test]
    fn test_client_from_default_config() {
        let client = PolymarketClient::from_config(&AppConfig::default()).unwrap();
        assert!(!client.rest().has_credentials());
        assert_eq!(client.source_name(), "Polymarket Gamma");
    }

    #[test]
    fn test_limit_price_slippage() {
        let c = client(dec!(2.0));
        assert_eq!(c.limit_price(dec!(0.50), TradeType::Buy), dec!(0.51));
        assert_eq!(c.limit_price(dec!(0.50), TradeType::Sell), dec!(0.49));
    }

    #[test]
    fn test_limit_price_clamped() {
        let c = client(dec!(2.0));
        assert_eq!(c.limit_price(dec!(0.98), TradeType::Buy), MAX_LIMIT_PRICE);
        assert_eq!(c.limit_price(dec!(0.005), TradeType::Sell), MIN_LIMIT_PRICE);
    }
}
