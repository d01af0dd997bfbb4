use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, info};

use common::{
    Config, FeedDocument, FeedStore, FuturesContext, Indicator, IndicatorRequest,
    IndicatorResult, IndicatorSource, Result, StoredFile, Thresholds, Timeframe,
    TimeframeSnapshot,
};
use strategy::{evaluate_traced, SignalContext};

use crate::binance::FuturesClient;
use crate::snapshot::{build_snapshot, TimeframeReadings};

/// What one feed run needs to know, minus credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct JobConfig {
    pub symbol: String,
    pub exchange: String,
    pub fast: Timeframe,
    pub slow: Timeframe,
    pub thresholds: Thresholds,
    pub file_name: String,
}

impl From<&Config> for JobConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            symbol: cfg.symbol.clone(),
            exchange: cfg.exchange.clone(),
            fast: cfg.tf_fast,
            slow: cfg.tf_slow,
            thresholds: cfg.thresholds,
            file_name: cfg.file_name.clone(),
        }
    }
}

/// One pass of the feed: fetch both timeframes, evaluate, publish.
///
/// Every call is awaited in sequence. The store is only touched after all
/// indicator data for the run has been fetched and validated, so a failed
/// run never publishes a partial document.
pub struct FeedJob {
    cfg: JobConfig,
    source: Arc<dyn IndicatorSource>,
    store: Arc<dyn FeedStore>,
    futures: Option<FuturesClient>,
}

impl FeedJob {
    pub fn new(cfg: JobConfig, source: Arc<dyn IndicatorSource>, store: Arc<dyn FeedStore>) -> Self {
        Self {
            cfg,
            source,
            store,
            futures: None,
        }
    }

    /// Attach perpetual-futures context to every published document.
    pub fn with_futures(mut self, client: FuturesClient) -> Self {
        self.futures = Some(client);
        self
    }

    pub async fn run(&self) -> Result<StoredFile> {
        info!(
            symbol = %self.cfg.symbol,
            fast = %self.cfg.fast,
            slow = %self.cfg.slow,
            "Feed run starting"
        );

        let fast = self.fetch_timeframe(self.cfg.fast).await?;
        let slow = self.fetch_timeframe(self.cfg.slow).await?;

        let futures = match &self.futures {
            Some(client) => Some(client.market_context(&self.cfg.symbol).await),
            None => None,
        };

        let doc = build_document(&self.cfg, fast, slow, futures, Utc::now());
        info!(signal = %doc.signal, timestamp = %doc.timestamp, "Signal computed");

        let content = doc.to_json()?;
        let stored = self.store.put(&self.cfg.file_name, &content).await?;
        info!(file = %self.cfg.file_name, url = %stored.raw_url, "Feed published");
        Ok(stored)
    }

    async fn fetch_timeframe(&self, timeframe: Timeframe) -> Result<TimeframeSnapshot> {
        let readings = TimeframeReadings {
            rsi: self.fetch(timeframe, Indicator::Rsi).await?,
            atr: self.fetch(timeframe, Indicator::Atr).await?,
            macd: self.fetch(timeframe, Indicator::Macd).await?,
            price: self.fetch(timeframe, Indicator::Price).await?,
            ema20: self.fetch(timeframe, Indicator::Ema20).await?,
            ema50: self.fetch(timeframe, Indicator::Ema50).await?,
            ema200: self.fetch(timeframe, Indicator::Ema200).await?,
            vwap: self.fetch(timeframe, Indicator::Vwap).await?,
            candle: self.fetch(timeframe, Indicator::Candle).await?,
        };

        let snapshot = build_snapshot(timeframe, &readings)?;
        info!(
            timeframe = %timeframe,
            rsi = snapshot.rsi,
            atr_pct = snapshot.atr_pct,
            macd = snapshot.macd,
            "Timeframe snapshot ready"
        );
        Ok(snapshot)
    }

    async fn fetch(&self, timeframe: Timeframe, indicator: Indicator) -> Result<IndicatorResult> {
        let request = IndicatorRequest::new(self.cfg.symbol.clone(), timeframe, indicator)?;
        let result = self.source.fetch(&request).await?;
        debug!(indicator = %indicator, timeframe = %timeframe, fields = result.values.len(), "Indicator fetched");
        Ok(result)
    }
}

/// Assemble the published document. Pure apart from the supplied `now`,
/// which is truncated to whole seconds.
pub fn build_document(
    cfg: &JobConfig,
    fast: TimeframeSnapshot,
    slow: TimeframeSnapshot,
    futures: Option<FuturesContext>,
    now: DateTime<Utc>,
) -> FeedDocument {
    let ctx = SignalContext::new(&fast, &slow, cfg.thresholds);
    let (signal, rule) = evaluate_traced(&ctx);
    debug!(rule, "Decision rule matched");

    FeedDocument {
        symbol: cfg.symbol.clone(),
        exchange: cfg.exchange.clone(),
        timestamp: now.trunc_subsecs(0),
        signal,
        fast,
        slow,
        params: cfg.thresholds,
        futures,
    }
}
