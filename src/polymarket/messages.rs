//! Polymarket API message types

use serde::{Deserialize, Serialize};

// ============================================================================
// Gamma API Response Types (Market Data)
// ============================================================================

/// Market from Gamma API
///
/// Gamma encodes several list fields either as JSON arrays or as strings
/// holding a JSON array, so those stay as raw values here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GammaMarket {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub outcomes: Option<serde_json::Value>,
    #[serde(default)]
    pub outcome_prices: Option<serde_json::Value>,
    #[serde(default)]
    pub clob_token_ids: Option<serde_json::Value>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub closed: Option<bool>,
}

/// Gamma markets response, either a bare list or a paginated wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GammaMarketsResponse {
    List(Vec<GammaMarket>),
    Paginated {
        #[serde(default)]
        data: Option<Vec<GammaMarket>>,
        #[serde(default)]
        markets: Option<Vec<GammaMarket>>,
        #[serde(default)]
        next_cursor: Option<String>,
    },
}

impl GammaMarketsResponse {
    pub fn into_markets(self) -> Vec<GammaMarket> {
        match self {
            GammaMarketsResponse::List(markets) => markets,
            GammaMarketsResponse::Paginated { data, markets, .. } => {
                data.or(markets).unwrap_or_default()
            }
        }
    }
}

// ============================================================================
// CLOB Order Types
// ============================================================================

/// Order payload of POST /order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBody {
    pub order: OrderArgs,
    /// API key of the order owner
    pub owner: String,
    pub order_type: String,
}

/// Limit order arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderArgs {
    #[serde(rename = "tokenID")]
    pub token_id: String,
    pub price: String,
    pub size: String,
    pub side: String,
}

/// Response from POST /order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error_msg: Option<String>,
    #[serde(rename = "orderID", default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_list_response() {
        let json = r#"[{"id": "1", "question": "Q?", "conditionId": "0xabc",
            "outcomePrices": "[\"0.86\", \"0.14\"]", "active": true}]"#;
        let markets: GammaMarketsResponse = serde_json::from_str(json).unwrap();
        let markets = markets.into_markets();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].condition_id.as_deref(), Some("0xabc"));
        assert!(markets[0].outcome_prices.is_some());
    }

    #[test]
    fn test_gamma_paginated_response() {
        let json = r#"{"data": [{"id": "2"}], "next_cursor": "abc"}"#;
        let markets: GammaMarketsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(markets.into_markets()[0].id.as_deref(), Some("2"));
    }

    #[test]
    fn test_order_body_field_names() {
        let body = OrderBody {
            order: OrderArgs {
                token_id: "123".to_string(),
                price: "0.85".to_string(),
                size: "100".to_string(),
                side: "BUY".to_string(),
            },
            owner: "key".to_string(),
            order_type: "GTC".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["order"]["tokenID"], "123");
        assert_eq!(json["orderType"], "GTC");
    }

    #[test]
    fn test_order_response() {
        let json = r#"{"success": true, "errorMsg": "", "orderID": "0xdead", "status": "matched"}"#;
        let response: OrderResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.order_id.as_deref(), Some("0xdead"));
    }
}
