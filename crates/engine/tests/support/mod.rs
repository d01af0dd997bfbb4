//! Mock-server helpers shared by the engine integration tests.
#![allow(dead_code)]

use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{Indicator, Secret, Thresholds, Timeframe};
use engine::{JobConfig, TaapiClient};

pub const SECRET: &str = "taapi-test-secret";
pub const SYMBOL: &str = "LAYER/USDT";

/// Indicator values served for one timeframe.
pub struct Readings {
    pub rsi: f64,
    pub atr: f64,
    pub macd: f64,
    pub price: f64,
}

pub fn job_config() -> JobConfig {
    JobConfig {
        symbol: SYMBOL.into(),
        exchange: "binance".into(),
        fast: Timeframe::M15,
        slow: Timeframe::H1,
        thresholds: Thresholds {
            atr_pct_min_fast: 0.3,
            atr_pct_min_slow: 0.5,
            macd_eps: 0.0005,
            rsi_high: 55.0,
            rsi_low: 45.0,
        },
        file_name: "layer_feed.json".into(),
    }
}

pub fn taapi_client(server: &MockServer) -> TaapiClient {
    TaapiClient::new(
        Secret::new(SECRET),
        "binance",
        Url::parse(&server.uri()).unwrap(),
        reqwest::Client::new(),
    )
}

pub fn value(v: f64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": v }))
}

/// Serve one indicator for one interval. Indicators sharing an endpoint are
/// told apart by their query parameters.
pub async fn mount_indicator(
    server: &MockServer,
    indicator: Indicator,
    interval: &str,
    response: ResponseTemplate,
) {
    let mut mock = Mock::given(method("GET"))
        .and(path(format!("/{}", indicator.endpoint())))
        .and(query_param("secret", SECRET))
        .and(query_param("exchange", "binance"))
        .and(query_param("symbol", SYMBOL))
        .and(query_param("interval", interval));
    for (key, val) in indicator.params() {
        mock = mock.and(query_param(*key, *val));
    }
    mock.respond_with(response).mount(server).await;
}

/// Serve every indicator the job fetches for one interval. Trend and candle
/// values are derived from `price`.
pub async fn mount_timeframe(server: &MockServer, interval: &str, r: Readings) {
    mount_indicator(server, Indicator::Rsi, interval, value(r.rsi)).await;
    mount_indicator(server, Indicator::Atr, interval, value(r.atr)).await;
    mount_indicator(server, Indicator::Price, interval, value(r.price)).await;
    mount_indicator(
        server,
        Indicator::Macd,
        interval,
        ResponseTemplate::new(200).set_body_json(json!({
            "valueMACD": r.macd,
            "valueMACDSignal": r.macd / 2.0,
            "valueMACDHist": r.macd / 2.0
        })),
    )
    .await;
    mount_indicator(server, Indicator::Ema20, interval, value(r.price * 0.99)).await;
    mount_indicator(server, Indicator::Ema50, interval, value(r.price * 0.97)).await;
    mount_indicator(server, Indicator::Ema200, interval, value(r.price * 0.9)).await;
    mount_indicator(server, Indicator::Vwap, interval, value(r.price * 0.98)).await;
    mount_indicator(
        server,
        Indicator::Candle,
        interval,
        ResponseTemplate::new(200).set_body_json(json!({
            "timestamp": 1760780700,
            "open": r.price * 0.99,
            "high": r.price * 1.02,
            "low": r.price * 0.97,
            "close": r.price,
            "volume": 250000.0
        })),
    )
    .await;
}
