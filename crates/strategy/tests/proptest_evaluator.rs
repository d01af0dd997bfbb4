use common::{Signal, Thresholds};
use proptest::prelude::*;
use strategy::{evaluate, SignalContext};

fn thresholds() -> Thresholds {
    Thresholds {
        atr_pct_min_fast: 0.3,
        atr_pct_min_slow: 0.5,
        macd_eps: 0.0005,
        rsi_high: 55.0,
        rsi_low: 45.0,
    }
}

proptest! {
    /// A quiet market on either timeframe gates every momentum reading.
    #[test]
    fn low_atr_always_wins(
        rsi_fast in 0.0f64..=100.0,
        rsi_slow in 0.0f64..=100.0,
        macd_fast in -10.0f64..10.0,
        macd_slow in -10.0f64..10.0,
        quiet_atr in 0.0f64..0.3,
        other_atr in 0.0f64..50.0,
        gate_fast in any::<bool>(),
    ) {
        let (atr_pct_fast, atr_pct_slow) = if gate_fast {
            (quiet_atr, other_atr)
        } else {
            (other_atr, quiet_atr)
        };
        let ctx = SignalContext {
            rsi_fast,
            rsi_slow,
            atr_pct_fast,
            atr_pct_slow,
            macd_fast,
            macd_slow,
            thresholds: thresholds(),
        };
        prop_assert_eq!(evaluate(&ctx), Signal::LowVolatility);
    }

    /// RSI inside the band on either timeframe never yields a directional signal.
    #[test]
    fn rsi_inside_band_is_never_directional(
        rsi_inside in 45.0f64..=55.0,
        rsi_other in 0.0f64..=100.0,
        macd_fast in -10.0f64..10.0,
        atr_pct_fast in 0.3f64..50.0,
        atr_pct_slow in 0.5f64..50.0,
    ) {
        let ctx = SignalContext {
            rsi_fast: rsi_inside,
            rsi_slow: rsi_other,
            atr_pct_fast,
            atr_pct_slow,
            macd_fast,
            macd_slow: 0.0,
            thresholds: thresholds(),
        };
        prop_assert_eq!(evaluate(&ctx), Signal::Neutral);
    }

    /// Same input, same output.
    #[test]
    fn evaluation_is_deterministic(
        rsi_fast in 0.0f64..=100.0,
        rsi_slow in 0.0f64..=100.0,
        atr_pct_fast in 0.0f64..5.0,
        atr_pct_slow in 0.0f64..5.0,
        macd_fast in -0.01f64..0.01,
    ) {
        let ctx = SignalContext {
            rsi_fast,
            rsi_slow,
            atr_pct_fast,
            atr_pct_slow,
            macd_fast,
            macd_slow: 0.0,
            thresholds: thresholds(),
        };
        let first = evaluate(&ctx);
        for _ in 0..3 {
            prop_assert_eq!(evaluate(&ctx), first);
        }
    }

    /// Bullish and bearish never both hold: MACD sign picks at most one.
    #[test]
    fn directional_signal_follows_macd_sign(
        rsi_fast in 0.0f64..=100.0,
        rsi_slow in 0.0f64..=100.0,
        macd_fast in -1.0f64..1.0,
    ) {
        let ctx = SignalContext {
            rsi_fast,
            rsi_slow,
            atr_pct_fast: 1.0,
            atr_pct_slow: 1.0,
            macd_fast,
            macd_slow: 0.0,
            thresholds: thresholds(),
        };
        match evaluate(&ctx) {
            Signal::Bullish => prop_assert!(macd_fast > 0.0005),
            Signal::Bearish => prop_assert!(macd_fast < -0.0005),
            Signal::Neutral => {}
            Signal::LowVolatility => prop_assert!(false, "ATR is above both thresholds"),
        }
    }
}

#[test]
fn documented_scenarios() {
    let base = SignalContext {
        rsi_fast: 60.0,
        rsi_slow: 60.0,
        atr_pct_fast: 1.2,
        atr_pct_slow: 0.9,
        macd_fast: 0.001,
        macd_slow: 0.002,
        thresholds: thresholds(),
    };
    assert_eq!(evaluate(&base), Signal::Bullish);

    let bearish = SignalContext {
        rsi_fast: 40.0,
        rsi_slow: 40.0,
        macd_fast: -0.001,
        ..base
    };
    assert_eq!(evaluate(&bearish), Signal::Bearish);

    let neutral = SignalContext {
        rsi_fast: 50.0,
        rsi_slow: 50.0,
        ..base
    };
    assert_eq!(evaluate(&neutral), Signal::Neutral);
}
