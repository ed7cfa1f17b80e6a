//! REST API client for the Polymarket Gamma and CLOB APIs

use reqwest::Client;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

use super::auth::{generate_auth_headers, AuthHeaders};
use super::messages::*;
use crate::common::errors::{AgentError, Result};
use crate::common::types::{OrderRequest, TradeType};
use crate::config::types::ApiCredentials;

/// REST API client for Polymarket
#[derive(Debug, Clone)]
pub struct PolymarketRestClient {
    /// HTTP client
    client: Client,
    /// Base URL for the CLOB API
    base_url: String,
    /// Base URL for the Gamma API
    gamma_url: String,
    /// Optional API credentials for authenticated endpoints
    credentials: Option<ApiCredentials>,
}

impl PolymarketRestClient {
    /// Create a new REST client (unauthenticated)
    pub fn new(base_url: &str, gamma_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, gamma_url, Duration::from_secs(30))
    }

    /// Create a new REST client with custom timeout
    pub fn with_timeout(base_url: &str, gamma_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            gamma_url: gamma_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    /// Set API credentials for authenticated requests
    pub fn with_credentials(mut self, credentials: ApiCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Generate authentication headers if credentials are set
    fn auth_headers(&self, method: &str, path: &str, body: &str) -> Result<Option<AuthHeaders>> {
        match &self.credentials {
            Some(creds) => {
                let headers = generate_auth_headers(
                    &creds.api_key,
                    &creds.api_secret,
                    &creds.passphrase,
                    method,
                    path,
                    body,
                )?;
                Ok(Some(headers))
            }
            None => Ok(None),
        }
    }

    // ========================================================================
    // Gamma API Endpoints (Market Data)
    // ========================================================================

    /// Get one market by condition ID
    ///
    /// Gamma filters on the plural `condition_ids` parameter and matches
    /// lowercase ids only.
    #[instrument(skip(self))]
    pub async fn get_gamma_market(&self, condition_id: &str) -> Result<GammaMarket> {
        let url = format!("{}/markets", self.gamma_url);
        let id = condition_id.to_lowercase();
        debug!("Fetching market from Gamma API: {}?condition_ids={}", url, id);

        let response = self
            .client
            .get(&url)
            .query(&[("condition_ids", id.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(AgentError::MarketNotFound(condition_id.to_string()));
            }
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::InvalidResponse(format!(
                "Gamma API returned status {}: {}",
                status, body
            )));
        }

        let markets: GammaMarketsResponse = response.json().await?;
        markets
            .into_markets()
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::MarketNotFound(condition_id.to_string()))
    }

    /// YES and NO prices of a Gamma market
    ///
    /// Accepts `outcomePrices` as an array or as a string holding an array,
    /// with each entry either a number or a numeric string.
    pub fn outcome_prices(market: &GammaMarket) -> Result<(Decimal, Decimal)> {
        let raw = market
            .outcome_prices
            .as_ref()
            .ok_or_else(|| AgentError::InvalidResponse("Market does not have outcome prices".to_string()))?;

        let prices = parse_json_list(raw)?
            .iter()
            .map(parse_price)
            .collect::<Result<Vec<_>>>()?;

        match prices.as_slice() {
            [yes, no, ..] => Ok((*yes, *no)),
            _ => Err(AgentError::InvalidResponse(format!(
                "Invalid outcome prices format: {}",
                raw
            ))),
        }
    }

    // ========================================================================
    // Authenticated Endpoints
    // ========================================================================

    /// Submit a limit order, returning the exchange order id
    #[instrument(skip(self), fields(token_id = %order.token_id))]
    pub async fn post_order(&self, order: &OrderRequest) -> Result<String> {
        let path = "/order";
        let owner = self
            .credentials
            .as_ref()
            .map(|c| c.api_key.clone())
            .ok_or_else(|| AgentError::Authentication("Order placement requires API credentials".to_string()))?;

        let side = match order.trade_type {
            TradeType::Buy => "BUY",
            TradeType::Sell => "SELL",
        };
        let payload = OrderBody {
            order: OrderArgs {
                token_id: order.token_id.clone(),
                price: order.price.normalize().to_string(),
                size: order.size.normalize().to_string(),
                side: side.to_string(),
            },
            owner,
            order_type: "GTC".to_string(),
        };
        let body = serde_json::to_string(&payload)?;

        let url = format!("{}{}", self.base_url, path);
        debug!("Posting order to: {}", url);

        let mut request = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.clone());
        if let Some(headers) = self.auth_headers("POST", path, &body)? {
            request = headers.apply_to_request(request);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::Execution(format!(
                "CLOB returned status {}: {}",
                status, text
            )));
        }

        let result: OrderResponse = response.json().await?;
        if !result.success {
            return Err(AgentError::Execution(
                result
                    .error_msg
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "order rejected".to_string()),
            ));
        }

        result
            .order_id
            .ok_or_else(|| AgentError::InvalidResponse("Order response without order id".to_string()))
    }
}

/// A JSON array, or a string containing one
fn parse_json_list(value: &serde_json::Value) -> Result<Vec<serde_json::Value>> {
    match value {
        serde_json::Value::Array(items) => Ok(items.clone()),
        serde_json::Value::String(s) => match serde_json::from_str::<serde_json::Value>(s)? {
            serde_json::Value::Array(items) => Ok(items),
            other => Err(AgentError::InvalidResponse(format!("Expected a list, got {}", other))),
        },
        other => Err(AgentError::InvalidResponse(format!("Expected a list, got {}", other))),
    }
}

fn parse_price(value: &serde_json::Value) -> Result<Decimal> {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(AgentError::InvalidResponse(format!("Invalid price: {}", other)));
        }
    };
    Decimal::from_str(text.trim())
        .or_else(|_| Decimal::from_scientific(text.trim()))
        .map_err(|e| AgentError::InvalidResponse(format!("Invalid price {}: {}", text, e)))
}
