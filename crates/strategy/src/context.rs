use serde::{Deserialize, Serialize};

use common::{Thresholds, TimeframeSnapshot};

/// Numeric snapshot the signal rules are evaluated against.
/// Built once per run from the fast and slow timeframe snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalContext {
    pub rsi_fast: f64,
    pub rsi_slow: f64,
    pub atr_pct_fast: f64,
    pub atr_pct_slow: f64,
    pub macd_fast: f64,
    pub macd_slow: f64,
    pub thresholds: Thresholds,
}

impl SignalContext {
    pub fn new(fast: &TimeframeSnapshot, slow: &TimeframeSnapshot, thresholds: Thresholds) -> Self {
        Self {
            rsi_fast: fast.rsi,
            rsi_slow: slow.rsi,
            atr_pct_fast: fast.atr_pct,
            atr_pct_slow: slow.atr_pct,
            macd_fast: fast.macd,
            macd_slow: slow.macd,
            thresholds,
        }
    }
}
