use common::{Error, IndicatorResult, Result, Timeframe, TimeframeSnapshot};

/// Every indicator result fetched for one timeframe.
#[derive(Debug, Clone)]
pub struct TimeframeReadings {
    pub rsi: IndicatorResult,
    pub atr: IndicatorResult,
    pub macd: IndicatorResult,
    pub price: IndicatorResult,
    pub ema20: IndicatorResult,
    pub ema50: IndicatorResult,
    pub ema200: IndicatorResult,
    pub vwap: IndicatorResult,
    pub candle: IndicatorResult,
}

/// Combine the indicator results of one timeframe into a snapshot.
///
/// Values outside their valid range (RSI outside [0, 100], negative ATR or
/// volume, non-positive prices, anything non-finite including the derived
/// ATR percent) are rejected here so they never reach the evaluator.
pub fn build_snapshot(timeframe: Timeframe, r: &TimeframeReadings) -> Result<TimeframeSnapshot> {
    let positive = |v: f64| v > 0.0;

    let rsi = checked(&r.rsi, "value", |v| (0.0..=100.0).contains(&v))?;
    let atr = checked(&r.atr, "value", |v| v >= 0.0)?;
    let price = checked(&r.price, "value", positive)?;
    let macd = checked(&r.macd, "valueMACD", |_| true)?;
    let macd_signal = checked(&r.macd, "valueMACDSignal", |_| true)?;
    let macd_hist = checked(&r.macd, "valueMACDHist", |_| true)?;

    let atr_pct = atr / price * 100.0;
    if !atr_pct.is_finite() {
        return Err(Error::OutOfRange {
            indicator: r.atr.indicator.to_string(),
            field: "atr_pct".to_string(),
            value: atr_pct,
        });
    }

    Ok(TimeframeSnapshot {
        timeframe,
        price,
        rsi,
        atr,
        atr_pct,
        macd,
        macd_signal,
        macd_hist,
        ema20: checked(&r.ema20, "value", positive)?,
        ema50: checked(&r.ema50, "value", positive)?,
        ema200: checked(&r.ema200, "value", positive)?,
        vwap: checked(&r.vwap, "value", positive)?,
        high: checked(&r.candle, "high", positive)?,
        low: checked(&r.candle, "low", positive)?,
        volume: checked(&r.candle, "volume", |v| v >= 0.0)?,
    })
}

fn checked(result: &IndicatorResult, field: &str, valid: impl Fn(f64) -> bool) -> Result<f64> {
    let value = result.field(field)?;
    if !value.is_finite() || !valid(value) {
        return Err(Error::OutOfRange {
            indicator: result.indicator.to_string(),
            field: field.to_string(),
            value,
        });
    }
    Ok(value)
}
