use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, Error, Result};

/// Candle interval accepted by the indicator service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "30m")]
    M30,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "2h")]
    H2,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "12h")]
    H12,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 10] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::H12,
        Timeframe::D1,
        Timeframe::W1,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::W1 => "1w",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Timeframe::ALL
            .into_iter()
            .find(|tf| tf.as_str() == s.trim())
            .ok_or_else(|| {
                let allowed: Vec<&str> = Timeframe::ALL.iter().map(|tf| tf.as_str()).collect();
                format!("'{s}' is not one of {}", allowed.join(" "))
            })
    }
}

/// Indicators the feed pulls from the indicator service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Rsi,
    Macd,
    Atr,
    /// Latest price, used to express ATR as a percent of price.
    Price,
    Ema20,
    Ema50,
    Ema200,
    Vwap,
    /// Last candle; supplies high, low and volume.
    Candle,
}

impl Indicator {
    /// Name used in logs, errors and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Indicator::Rsi => "rsi",
            Indicator::Macd => "macd",
            Indicator::Atr => "atr",
            Indicator::Price => "price",
            Indicator::Ema20 => "ema20",
            Indicator::Ema50 => "ema50",
            Indicator::Ema200 => "ema200",
            Indicator::Vwap => "vwap",
            Indicator::Candle => "candle",
        }
    }

    /// Endpoint path segment. The EMAs share one endpoint and differ by period.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Indicator::Ema20 | Indicator::Ema50 | Indicator::Ema200 => "ema",
            other => other.as_str(),
        }
    }

    /// Indicator-specific query parameters.
    pub fn params(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Indicator::Rsi | Indicator::Atr => &[("period", "14")],
            Indicator::Ema20 => &[("period", "20")],
            Indicator::Ema50 => &[("period", "50")],
            Indicator::Ema200 => &[("period", "200")],
            Indicator::Macd | Indicator::Price | Indicator::Vwap | Indicator::Candle => &[],
        }
    }

    /// Numeric fields a response must carry to be usable.
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Indicator::Macd => &["valueMACD", "valueMACDSignal", "valueMACDHist"],
            Indicator::Candle => &["high", "low", "volume"],
            _ => &["value"],
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indicator lookup for a symbol and timeframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorRequest {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub indicator: Indicator,
}

impl IndicatorRequest {
    pub fn new(symbol: impl Into<String>, timeframe: Timeframe, indicator: Indicator) -> Result<Self> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ConfigError::single_invalid("SYMBOL", "must not be empty").into());
        }
        Ok(Self {
            symbol,
            timeframe,
            indicator,
        })
    }
}

/// Numeric fields parsed from one indicator response.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorResult {
    pub indicator: Indicator,
    pub values: BTreeMap<String, f64>,
}

impl IndicatorResult {
    pub fn new(indicator: Indicator, values: BTreeMap<String, f64>) -> Self {
        Self { indicator, values }
    }

    /// Look up a numeric field, failing with `MissingField` when absent.
    pub fn field(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| Error::MissingField {
                indicator: self.indicator.to_string(),
                field: name.to_string(),
            })
    }
}

/// Signal label published in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    Bullish,
    Bearish,
    Neutral,
    LowVolatility,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Bullish => write!(f, "BULLISH"),
            Signal::Bearish => write!(f, "BEARISH"),
            Signal::Neutral => write!(f, "NEUTRAL"),
            Signal::LowVolatility => write!(f, "LOW_VOLATILITY"),
        }
    }
}

/// Strategy parameters, published alongside the signal they produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub atr_pct_min_fast: f64,
    pub atr_pct_min_slow: f64,
    pub macd_eps: f64,
    pub rsi_high: f64,
    pub rsi_low: f64,
}

/// Validated indicator values for one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeSnapshot {
    pub timeframe: Timeframe,
    pub price: f64,
    pub rsi: f64,
    pub atr: f64,
    /// ATR as a percent of `price`.
    pub atr_pct: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    // Published for consumers of the feed; never read by the evaluator.
    pub ema20: f64,
    pub ema50: f64,
    pub ema200: f64,
    pub vwap: f64,
    /// Last candle.
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookImbalance {
    pub bids_qty: f64,
    pub asks_qty: f64,
    /// `100 * (bids - asks) / (bids + asks)`.
    pub imbalance_pct: f64,
}

/// Perpetual-futures context attached to the feed when enabled.
/// Every item is best-effort; a failed lookup is published as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuturesContext {
    pub funding_rate: Option<f64>,
    pub open_interest: Option<f64>,
    pub order_book: Option<OrderBookImbalance>,
    pub updated: DateTime<Utc>,
}

/// The published artifact. Overwrites the previous document wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedDocument {
    pub symbol: String,
    pub exchange: String,
    pub timestamp: DateTime<Utc>,
    pub signal: Signal,
    pub fast: TimeframeSnapshot,
    pub slow: TimeframeSnapshot,
    pub params: Thresholds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub futures: Option<FuturesContext>,
}

impl FeedDocument {
    /// Pretty-printed JSON, keys in field declaration order.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_parses_known_intervals() {
        assert_eq!("15m".parse::<Timeframe>().unwrap(), Timeframe::M15);
        assert_eq!(" 1h ".parse::<Timeframe>().unwrap(), Timeframe::H1);
        assert!("7m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn request_rejects_blank_symbol() {
        let err = IndicatorRequest::new("  ", Timeframe::M15, Indicator::Rsi).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_field_names_indicator_and_key() {
        let result = IndicatorResult::new(Indicator::Macd, BTreeMap::new());
        let err = result.field("valueMACD").unwrap_err();
        assert_eq!(err.to_string(), "Missing field 'valueMACD' in macd response");
    }

    #[test]
    fn signal_serializes_screaming_snake_case() {
        let json = serde_json::to_string(&Signal::LowVolatility).unwrap();
        assert_eq!(json, "\"LOW_VOLATILITY\"");
        assert_eq!(Signal::LowVolatility.to_string(), "LOW_VOLATILITY");
    }

    #[test]
    fn emas_share_one_endpoint_with_distinct_periods() {
        for (indicator, period) in [
            (Indicator::Ema20, "20"),
            (Indicator::Ema50, "50"),
            (Indicator::Ema200, "200"),
        ] {
            assert_eq!(indicator.endpoint(), "ema");
            assert_eq!(indicator.params(), &[("period", period)]);
        }
        assert_eq!(Indicator::Ema200.to_string(), "ema200");
        assert_eq!(Indicator::Vwap.endpoint(), "vwap");
    }

    #[test]
    fn required_fields_per_indicator() {
        assert_eq!(Indicator::Rsi.fields(), &["value"]);
        assert_eq!(
            Indicator::Macd.fields(),
            &["valueMACD", "valueMACDSignal", "valueMACDHist"]
        );
        assert_eq!(Indicator::Candle.fields(), &["high", "low", "volume"]);
    }

    #[test]
    fn timeframe_serializes_as_interval_string() {
        assert_eq!(serde_json::to_string(&Timeframe::H12).unwrap(), "\"12h\"");
    }
}
