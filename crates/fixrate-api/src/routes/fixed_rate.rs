//! Fixed-rate market endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use eth_node_client::NodeClient;
use fixed_rate::{
    constants::DEFAULT_EXPIRY_LOOKAHEAD_BLOCKS, fetch_market_pricing, fetch_next_expiry,
    MarketPricingState, NextExpiry, SnapshotQuote, TokenScales,
};
use fixrate_core::{Address, MarketConfig, ProtocolError};

use super::{protocol_error, ApiResult};
use crate::dto::{ApiError, MarketSummary, NextExpiryQuery, PricingQuery, QuoteRequest};
use crate::AppState;

/// Create fixed-rate routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/markets", get(list_markets))
        .route("/markets/:id/pricing", get(get_pricing))
        .route("/markets/:id/next-expiry", get(get_next_expiry))
        .route("/quote", post(quote))
}

/// GET /fixed-rate/markets
pub async fn list_markets(State(state): State<AppState>) -> Json<Vec<MarketSummary>> {
    let config = state.config().await;
    Json(config.markets.iter().map(MarketSummary::from).collect())
}

async fn find_market(
    state: &AppState,
    id: &str,
) -> Result<MarketConfig, (StatusCode, Json<ApiError>)> {
    state.market(id).await.ok_or_else(|| {
        protocol_error(ProtocolError::MarketNotFound { id: id.to_string() })
    })
}

/// Connected node serving the configured network
async fn ready_client(state: &AppState) -> Result<NodeClient, (StatusCode, Json<ApiError>)> {
    let client = state.node_client().await.ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::node_unavailable("Node not connected")),
        )
    })?;

    if let Some(caps) = client.capabilities().await {
        let network = state.network().await;
        if !caps.matches_network(network) {
            return Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiError::new(
                    "network_mismatch",
                    format!(
                        "Node chain id {:?} does not serve {}",
                        caps.chain_id, network
                    ),
                )),
            ));
        }
        if caps.is_syncing {
            tracing::warn!(height = caps.chain_height, "Node is syncing, pricing may be stale");
        }
    }

    Ok(client)
}

/// GET /fixed-rate/markets/:id/pricing?wallet=0x...
pub async fn get_pricing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PricingQuery>,
) -> ApiResult<MarketPricingState> {
    let market = find_market(&state, &id).await?;

    let wallet = query
        .wallet
        .as_deref()
        .filter(|w| !w.is_empty())
        .map(Address::parse)
        .transpose()
        .map_err(protocol_error)?;

    let client = ready_client(&state).await?;
    let blocks_per_year = state.blocks_per_year().await;

    let pricing = fetch_market_pricing(
        &client,
        &market,
        wallet.as_ref(),
        &TokenScales::default(),
        blocks_per_year,
    )
    .await
    .map_err(protocol_error)?;

    Ok(Json(pricing))
}

/// GET /fixed-rate/markets/:id/next-expiry?min_blocks=N
pub async fn get_next_expiry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<NextExpiryQuery>,
) -> ApiResult<NextExpiry> {
    let market = find_market(&state, &id).await?;
    let min_blocks = query.min_blocks.unwrap_or(DEFAULT_EXPIRY_LOOKAHEAD_BLOCKS);

    let client = ready_client(&state).await?;
    let next = fetch_next_expiry(&client, &market, min_blocks)
        .await
        .map_err(protocol_error)?;

    Ok(Json(next))
}

/// POST /fixed-rate/quote - Price a supplied raw snapshot
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<SnapshotQuote> {
    let blocks_per_year = match request.blocks_per_year {
        Some(bpy) => bpy,
        None => state.blocks_per_year().await,
    };

    let quote = SnapshotQuote::price(&request.raw, &request.scales, blocks_per_year)
        .map_err(|e| protocol_error(e.into()))?;

    Ok(Json(quote))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use fixrate_core::{AppConfig, NodeConfig};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::create_router;
    use crate::AppState;

    fn config() -> AppConfig {
        AppConfig::from_json(
            r#"{
                "node": { "url": "http://127.0.0.1:1", "request_timeout_secs": 1 },
                "network": "local",
                "markets": [{
                    "id": "cusdc",
                    "name": "Fixed cUSDC",
                    "underlying_symbol": "USDC",
                    "ctoken": "0x39aa39c021dfbae8fac545936693ac917d5e7563",
                    "series": "0x1111111111111111111111111111111111111111",
                    "pair": "0x2222222222222222222222222222222222222222"
                }]
            }"#,
        )
        .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let app = create_router(AppState::with_config(config()));
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn raw_snapshot() -> Value {
        json!({
            "blockHeight": 14_000_000u64,
            "claimReserve": 100_000_000_000u64,
            "collateralReserve": 90_000_000_000u64,
            "minExchangeRate": 10_000_000_000_000_000u64,
            "currentExchangeRate": 10_000_000_000_000_000u64,
            "collateralFactor": 100_000_000_000_000_000u64,
            "blocksToExpiry": 100_000u64
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_list_markets() {
        let (status, body) = send(get("/fixed-rate/markets")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["id"], "cusdc");
        assert_eq!(body[0]["underlying_symbol"], "USDC");
    }

    #[tokio::test]
    async fn test_pricing_unknown_market() {
        let (status, body) = send(get("/fixed-rate/markets/cdai/pricing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "market_not_found");
    }

    #[tokio::test]
    async fn test_pricing_rejects_bad_wallet() {
        let (status, body) = send(get("/fixed-rate/markets/cusdc/pricing?wallet=0x1234")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_address");
    }

    #[tokio::test]
    async fn test_pricing_without_node() {
        let (status, body) = send(get("/fixed-rate/markets/cusdc/pricing")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "node_unavailable");
    }

    #[tokio::test]
    async fn test_quote() {
        let request = post_json("/fixed-rate/quote", json!({ "raw": raw_snapshot() }));
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::OK);

        let spot = body["metrics"]["spotPrice"].as_f64().unwrap();
        assert!((spot - 0.9).abs() < 1e-12);
        assert_eq!(body["metrics"]["apyFlag"], "extreme");
        assert_eq!(body["metrics"]["hedgeRatio"], Value::Null);
        assert_eq!(body["display"]["spotPrice"], "0.9000");
        assert_eq!(body["secondsToMaturity"], 1_312_670);
    }

    #[tokio::test]
    async fn test_quote_empty_pool() {
        let mut raw = raw_snapshot();
        raw["claimReserve"] = json!(0);

        let (status, body) = send(post_json("/fixed-rate/quote", json!({ "raw": raw }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "degenerate_market");
    }

    #[tokio::test]
    async fn test_quote_rejects_negative_blocks_per_year() {
        let (status, body) = send(post_json(
            "/fixed-rate/quote",
            json!({ "raw": raw_snapshot(), "blocksPerYear": -1.0 }),
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "invalid_amount");
    }

    #[tokio::test]
    async fn test_quote_request_keys_are_camel_case() {
        // Doubling blocks per year doubles the annualized rate
        let (_, base) = send(post_json("/fixed-rate/quote", json!({ "raw": raw_snapshot() }))).await;
        let (status, doubled) = send(post_json(
            "/fixed-rate/quote",
            json!({ "raw": raw_snapshot(), "blocksPerYear": 4_804_864.0 }),
        ))
        .await;
        assert_eq!(status, StatusCode::OK);

        let base_apy = base["metrics"]["impliedFixedApy"].as_f64().unwrap();
        let doubled_apy = doubled["metrics"]["impliedFixedApy"].as_f64().unwrap();
        assert!((doubled_apy - 2.0 * base_apy).abs() < 1e-9 * base_apy.abs());

        // The snake_case key is not part of the request shape
        let (_, ignored) = send(post_json(
            "/fixed-rate/quote",
            json!({ "raw": raw_snapshot(), "blocks_per_year": 4_804_864.0 }),
        ))
        .await;
        assert_eq!(ignored["metrics"]["impliedFixedApy"], base["metrics"]["impliedFixedApy"]);
    }

    #[tokio::test]
    async fn test_quote_rejects_non_finite_result() {
        // Spot 3.0 puts the rate gap below -1, which f64::MAX blocks per year
        // annualizes to -inf
        let mut raw = raw_snapshot();
        raw["claimReserve"] = json!(30_000_000_000u64);

        let (status, body) = send(post_json(
            "/fixed-rate/quote",
            json!({ "raw": raw, "blocksPerYear": f64::MAX }),
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "degenerate_market");
    }

    #[tokio::test]
    async fn test_node_status_offline() {
        let (status, body) = send(get("/node/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["connected"], false);
        assert_eq!(body["url"], "http://127.0.0.1:1");
        assert_eq!(body["network"], "local");
    }

    #[tokio::test]
    async fn test_configure_node() {
        let state = AppState::with_config(config());
        let app = create_router(state.clone());

        let response = app
            .oneshot(post_json(
                "/node/configure",
                json!({ "url": "http://127.0.0.1:2" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let node: NodeConfig = state.config().await.node;
        assert_eq!(node.url, "http://127.0.0.1:2");
        assert_eq!(node.request_timeout_secs, 30);
    }
}
