use chrono::{SubsecRound, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use common::{excerpt, Error, FuturesContext, OrderBookImbalance, Result};

const SERVICE: &str = "binance-futures";

/// Public (unauthenticated) Binance USD-M futures endpoints used to enrich the
/// feed with perpetual-market context.
pub struct FuturesClient {
    base_url: Url,
    http: Client,
}

impl FuturesClient {
    pub fn new(base_url: Url, http: Client) -> Self {
        Self { base_url, http }
    }

    /// Funding rate, open interest and top-of-book imbalance for the perpetual
    /// of `symbol`. Each item is looked up independently; a failure is logged
    /// and leaves that item `None`.
    pub async fn market_context(&self, symbol: &str) -> FuturesContext {
        let pair = perpetual_symbol(symbol);
        debug!(pair = %pair, "Fetching futures context");

        let funding_rate = best_effort("funding_rate", self.funding_rate(&pair).await);
        let open_interest = best_effort("open_interest", self.open_interest(&pair).await);
        let order_book = best_effort("order_book", self.order_book(&pair).await);

        FuturesContext {
            funding_rate,
            open_interest,
            order_book,
            updated: Utc::now().trunc_subsecs(0),
        }
    }

    async fn funding_rate(&self, pair: &str) -> Result<f64> {
        let rows: Vec<FundingRateRow> = self
            .get_json("/fapi/v1/fundingRate", &[("symbol", pair), ("limit", "1")])
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| Error::upstream(SERVICE, "empty funding rate history"))?;
        parse_decimal("fundingRate", &row.funding_rate)
    }

    async fn open_interest(&self, pair: &str) -> Result<f64> {
        let rows: Vec<OpenInterestRow> = self
            .get_json(
                "/futures/data/openInterestHist",
                &[("symbol", pair), ("period", "5m"), ("limit", "1")],
            )
            .await?;
        let row = rows
            .first()
            .ok_or_else(|| Error::upstream(SERVICE, "empty open interest history"))?;
        parse_decimal("sumOpenInterest", &row.sum_open_interest)
    }

    async fn order_book(&self, pair: &str) -> Result<OrderBookImbalance> {
        let depth: Depth = self
            .get_json("/fapi/v1/depth", &[("symbol", pair), ("limit", "5")])
            .await?;
        let bids = level_quantities(&depth.bids)?;
        let asks = level_quantities(&depth.asks)?;
        imbalance(&bids, &asks).ok_or_else(|| Error::upstream(SERVICE, "order book is empty"))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{path}", self.base_url.as_str().trim_end_matches('/'));
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("request to {path} failed: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("reading {path} response failed: {e}")))?;

        if !status.is_success() {
            return Err(Error::upstream(
                SERVICE,
                format!("HTTP {status} for {path}: {}", excerpt(&body, 200)),
            ));
        }
        serde_json::from_str(&body)
            .map_err(|e| Error::upstream(SERVICE, format!("unparseable {path} response: {e}")))
    }
}

/// `LAYER/USDT` → `LAYERUSDT`.
pub fn perpetual_symbol(symbol: &str) -> String {
    symbol.replace('/', "").trim().to_uppercase()
}

/// Summarize top-of-book quantities. `None` when both sides are empty.
pub fn imbalance(bids: &[f64], asks: &[f64]) -> Option<OrderBookImbalance> {
    let bids_qty: f64 = bids.iter().sum();
    let asks_qty: f64 = asks.iter().sum();
    let total = bids_qty + asks_qty;
    if total <= 0.0 {
        return None;
    }
    Some(OrderBookImbalance {
        bids_qty,
        asks_qty,
        imbalance_pct: 100.0 * (bids_qty - asks_qty) / total,
    })
}

fn best_effort<T>(item: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(item, error = %e, "Futures context item unavailable");
            None
        }
    }
}

fn parse_decimal(field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| Error::upstream(SERVICE, format!("{field} '{raw}' is not a number: {e}")))
}

fn level_quantities(levels: &[(String, String)]) -> Result<Vec<f64>> {
    levels
        .iter()
        .map(|(_price, qty)| parse_decimal("quantity", qty))
        .collect()
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundingRateRow {
    funding_rate: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestRow {
    sum_open_interest: String,
}

/// Levels are `[price, quantity]` string pairs.
#[derive(Deserialize)]
struct Depth {
    bids: Vec<(String, String)>,
    asks: Vec<(String, String)>,
}
