//! Integration tests for the Polymarket client against mocked Gamma and
//! CLOB endpoints

mod common;

use common::api_responses::{
    GAMMA_MARKETS_ARRAY, GAMMA_MARKETS_BAD_SUM, GAMMA_MARKETS_STRINGIFIED, ORDER_ACCEPTED,
    ORDER_REJECTED,
};
use common::{CONDITION_ID, NO_TOKEN, YES_TOKEN};
use polymarket_hedge_agent::common::errors::AgentError;
use polymarket_hedge_agent::common::traits::{MarketDataSource, OrderExecutor};
use polymarket_hedge_agent::common::types::{OrderRequest, OutcomeSide, TradeType};
use polymarket_hedge_agent::config::ApiCredentials;
use polymarket_hedge_agent::polymarket::{PolymarketClient, PolymarketRestClient};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use wiremock::matchers::{body_partial_json, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// URL-safe base64 of "test-secret-bytes"
const API_SECRET: &str = "dGVzdC1zZWNyZXQtYnl0ZXM=";

fn client_for(server: &MockServer) -> PolymarketClient {
    let rest = PolymarketRestClient::new(&server.uri(), &server.uri()).unwrap();
    PolymarketClient::new(rest, dec!(2))
}

fn authed_client_for(server: &MockServer) -> PolymarketClient {
    let rest = PolymarketRestClient::new(&server.uri(), &server.uri())
        .unwrap()
        .with_credentials(ApiCredentials::new(
            "api-key-1".to_string(),
            API_SECRET.to_string(),
            "pass-1".to_string(),
        ));
    PolymarketClient::new(rest, dec!(2))
}

fn sell_yes() -> OrderRequest {
    OrderRequest {
        token_id: YES_TOKEN.to_string(),
        side: OutcomeSide::Yes,
        trade_type: TradeType::Sell,
        size: dec!(1250),
        price: dec!(0.86),
    }
}

async fn mount_gamma(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/markets"))
        .and(query_param("condition_ids", CONDITION_ID.to_lowercase()))
        .respond_with(ResponseTemplate::new(status).set_body_raw(body.to_string(), "application/json"))
        .mount(server)
        .await;
}

// ============================================================================
// Market data
// ============================================================================

#[tokio::test]
async fn test_fetch_prices_from_stringified_array() {
    let server = MockServer::start().await;
    mount_gamma(&server, 200, GAMMA_MARKETS_STRINGIFIED).await;

    let prices = client_for(&server).fetch_current_prices(CONDITION_ID).await.unwrap();
    assert_eq!(prices.yes_price, dec!(0.86));
    assert_eq!(prices.no_price, dec!(0.14));
    assert_eq!(prices.implied_probability(), dec!(0.86));
}

#[tokio::test]
async fn test_fetch_prices_from_number_array() {
    let server = MockServer::start().await;
    mount_gamma(&server, 200, GAMMA_MARKETS_ARRAY).await;

    let prices = client_for(&server).fetch_current_prices(CONDITION_ID).await.unwrap();
    assert_eq!(prices.yes_price, dec!(0.8));
    assert_eq!(prices.no_price, dec!(0.2));
}

#[tokio::test]
async fn test_gamma_market_fields() {
    let server = MockServer::start().await;
    mount_gamma(&server, 200, GAMMA_MARKETS_STRINGIFIED).await;

    let rest = PolymarketRestClient::new(&server.uri(), &server.uri()).unwrap();
    let market = rest.get_gamma_market(CONDITION_ID).await.unwrap();
    assert_eq!(market.question.as_deref(), Some("Will the Bills win the Super Bowl?"));
    assert_eq!(market.active, Some(true));
}

#[tokio::test]
async fn test_unknown_market_is_not_found() {
    let server = MockServer::start().await;
    mount_gamma(&server, 200, "[]").await;

    let result = client_for(&server).fetch_current_prices(CONDITION_ID).await;
    assert!(matches!(result, Err(AgentError::MarketNotFound(_))));
}

#[tokio::test]
async fn test_404_is_not_found() {
    let server = MockServer::start().await;
    mount_gamma(&server, 404, "{}").await;

    let result = client_for(&server).fetch_current_prices(CONDITION_ID).await;
    assert!(matches!(result, Err(AgentError::MarketNotFound(_))));
}

#[tokio::test]
async fn test_server_error_is_invalid_response() {
    let server = MockServer::start().await;
    mount_gamma(&server, 503, "upstream down").await;

    let err = client_for(&server).fetch_current_prices(CONDITION_ID).await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidResponse(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_inconsistent_quote_rejected() {
    let server = MockServer::start().await;
    mount_gamma(&server, 200, GAMMA_MARKETS_BAD_SUM).await;

    let result = client_for(&server).fetch_current_prices(CONDITION_ID).await;
    match result {
        Err(AgentError::InvalidMarketData { yes_price, no_price }) => {
            assert_eq!(yes_price, dec!(0.70));
            assert_eq!(no_price, dec!(0.50));
        }
        other => panic!("expected InvalidMarketData, got {:?}", other),
    }
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_place_order_signs_and_applies_slippage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/order"))
        .and(header_exists("poly_api_key"))
        .and(header_exists("poly_signature"))
        .and(header_exists("poly_timestamp"))
        .and(header_exists("poly_passphrase"))
        .and(body_partial_json(serde_json::json!({
            "order": {"tokenID": YES_TOKEN, "side": "SELL", "size": "1250", "price": "0.8428"},
            "owner": "api-key-1",
            "orderType": "GTC"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ORDER_ACCEPTED, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let order_id = authed_client_for(&server).place_order(&sell_yes()).await.unwrap();
    assert_eq!(order_id, "0xorder123");
}

#[tokio::test]
async fn test_order_size_rounded_to_clob_precision() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/order"))
        .and(body_partial_json(serde_json::json!({
            "order": {"tokenID": NO_TOKEN, "side": "BUY", "size": "7678.57", "price": "0.1428"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ORDER_ACCEPTED, "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let buy_no = OrderRequest {
        token_id: NO_TOKEN.to_string(),
        side: OutcomeSide::No,
        trade_type: TradeType::Buy,
        size: dec!(7678.571428571428571428571429),
        price: dec!(0.14),
    };
    authed_client_for(&server).place_order(&buy_no).await.unwrap();
}

#[tokio::test]
async fn test_dust_order_is_rejected_locally() {
    let server = MockServer::start().await;
    let dust = OrderRequest {
        size: dec!(0.004),
        ..sell_yes()
    };
    let result = authed_client_for(&server).place_order(&dust).await;
    assert!(matches!(result, Err(AgentError::InvalidArgument(_))));
}

#[tokio::test]
async fn test_rejected_order_is_execution_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/order"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(ORDER_REJECTED, "application/json"))
        .mount(&server)
        .await;

    let err = authed_client_for(&server).place_order(&sell_yes()).await.unwrap_err();
    match err {
        AgentError::Execution(msg) => assert!(msg.contains("allowance")),
        other => panic!("expected Execution, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_failure_is_execution_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/order"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid signature"))
        .mount(&server)
        .await;

    let result = authed_client_for(&server).place_order(&sell_yes()).await;
    assert!(matches!(result, Err(AgentError::Execution(_))));
}

#[tokio::test]
async fn test_order_without_credentials() {
    let server = MockServer::start().await;
    let result = client_for(&server).place_order(&sell_yes()).await;
    assert!(matches!(result, Err(AgentError::Authentication(_))));
}
