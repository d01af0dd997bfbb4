use tracing::debug;

use common::Signal;

use crate::SignalContext;

/// One row of the decision table.
#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub signal: Signal,
    pub applies: fn(&SignalContext) -> bool,
}

/// Ordered decision table. The first rule whose predicate holds decides the
/// signal; the last row always applies.
pub const RULES: [Rule; 4] = [
    Rule {
        name: "volatility_gate",
        signal: Signal::LowVolatility,
        applies: volatility_too_low,
    },
    Rule {
        name: "bullish_momentum",
        signal: Signal::Bullish,
        applies: bullish_momentum,
    },
    Rule {
        name: "bearish_momentum",
        signal: Signal::Bearish,
        applies: bearish_momentum,
    },
    Rule {
        name: "fallback",
        signal: Signal::Neutral,
        applies: always,
    },
];

/// Classify the market state. Pure: the same context always yields the same
/// signal.
pub fn evaluate(ctx: &SignalContext) -> Signal {
    evaluate_traced(ctx).0
}

/// Like [`evaluate`], also naming the rule that matched.
pub fn evaluate_traced(ctx: &SignalContext) -> (Signal, &'static str) {
    let (signal, name) = RULES
        .iter()
        .find(|rule| (rule.applies)(ctx))
        .map(|rule| (rule.signal, rule.name))
        .unwrap_or((Signal::Neutral, "fallback"));
    debug!(signal = %signal, rule = name, "Signal evaluated");
    (signal, name)
}

fn volatility_too_low(ctx: &SignalContext) -> bool {
    ctx.atr_pct_fast < ctx.thresholds.atr_pct_min_fast
        || ctx.atr_pct_slow < ctx.thresholds.atr_pct_min_slow
}

fn bullish_momentum(ctx: &SignalContext) -> bool {
    let t = &ctx.thresholds;
    ctx.rsi_fast > t.rsi_high
        && ctx.rsi_slow > t.rsi_high
        && ctx.macd_fast.abs() > t.macd_eps
        && ctx.macd_fast > 0.0
}

fn bearish_momentum(ctx: &SignalContext) -> bool {
    let t = &ctx.thresholds;
    ctx.rsi_fast < t.rsi_low
        && ctx.rsi_slow < t.rsi_low
        && ctx.macd_fast.abs() > t.macd_eps
        && ctx.macd_fast < 0.0
}

fn always(_: &SignalContext) -> bool {
    true
}
