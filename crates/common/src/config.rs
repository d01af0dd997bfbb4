use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::{ConfigError, Thresholds, Timeframe};

const DEFAULT_EXCHANGE: &str = "binance";
const DEFAULT_TAAPI_URL: &str = "https://api.taapi.io";
const DEFAULT_GIST_API_URL: &str = "https://api.github.com";
const DEFAULT_FUTURES_API_URL: &str = "https://fapi.binance.com";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// All configuration loaded from environment variables at startup.
/// Every missing or malformed key is reported together in one `ConfigError`.
#[derive(Debug, Clone)]
pub struct Config {
    // Credentials
    pub taapi_secret: Secret,
    pub gist_token: Secret,

    // Target store
    pub gist_id: String,
    pub file_name: String,

    // Market
    pub symbol: String,
    pub exchange: String,
    pub tf_fast: Timeframe,
    pub tf_slow: Timeframe,

    // Strategy
    pub thresholds: Thresholds,

    // Endpoints
    pub taapi_url: Url,
    pub gist_api_url: Url,
    pub futures_api_url: Url,
    pub include_futures: bool,
    pub http_timeout: Duration,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present; variables already in the process win.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. No network or filesystem access.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvReader::new(lookup);

        let taapi_secret = env.required("TAAPI_SECRET").map(Secret::new);
        let gist_token = env.required("GIST_TOKEN").map(Secret::new);
        let gist_id = env.required("GIST_ID");
        let symbol = env.required("SYMBOL");
        let tf_fast = env.required_parsed::<Timeframe>("TF_FAST");
        let tf_slow = env.required_parsed::<Timeframe>("TF_SLOW");
        let atr_pct_min_fast = env.required_float("ATR_PCT_MIN_FAST", 0.0, f64::MAX);
        let atr_pct_min_slow = env.required_float("ATR_PCT_MIN_SLOW", 0.0, f64::MAX);
        let macd_eps = env.required_float("MACD_EPS", 0.0, f64::MAX);
        let rsi_high = env.required_float("RSI_HIGH", 0.0, 100.0);
        let rsi_low = env.required_float("RSI_LOW", 0.0, 100.0);
        let file_name = env.required("FILE_NAME");

        let exchange = env
            .optional("EXCHANGE")
            .unwrap_or_else(|| DEFAULT_EXCHANGE.to_string());
        let taapi_url = env.optional_parsed::<Url>("TAAPI_URL", DEFAULT_TAAPI_URL);
        let gist_api_url = env.optional_parsed::<Url>("GIST_API_URL", DEFAULT_GIST_API_URL);
        let futures_api_url = env.optional_parsed::<Url>("FUTURES_API_URL", DEFAULT_FUTURES_API_URL);
        let include_futures = env.optional_flag("INCLUDE_FUTURES");
        let http_timeout = env
            .optional_parsed::<u64>("HTTP_TIMEOUT_SECS", &DEFAULT_HTTP_TIMEOUT_SECS.to_string())
            .map(Duration::from_secs);

        if let (Some(low), Some(high)) = (rsi_low, rsi_high) {
            if low >= high {
                env.errors
                    .invalid("RSI_LOW", format!("{low} must be below RSI_HIGH {high}"));
            }
        }

        if !env.errors.is_empty() {
            return Err(env.errors);
        }

        let (
            Some(taapi_secret),
            Some(gist_token),
            Some(gist_id),
            Some(symbol),
            Some(tf_fast),
            Some(tf_slow),
            Some(atr_pct_min_fast),
            Some(atr_pct_min_slow),
            Some(macd_eps),
            Some(rsi_high),
            Some(rsi_low),
            Some(file_name),
            Some(taapi_url),
            Some(gist_api_url),
            Some(futures_api_url),
            Some(include_futures),
            Some(http_timeout),
        ) = (
            taapi_secret,
            gist_token,
            gist_id,
            symbol,
            tf_fast,
            tf_slow,
            atr_pct_min_fast,
            atr_pct_min_slow,
            macd_eps,
            rsi_high,
            rsi_low,
            file_name,
            taapi_url,
            gist_api_url,
            futures_api_url,
            include_futures,
            http_timeout,
        )
        else {
            return Err(env.errors);
        };

        Ok(Config {
            taapi_secret,
            gist_token,
            gist_id,
            file_name,
            symbol,
            exchange,
            tf_fast,
            tf_slow,
            thresholds: Thresholds {
                atr_pct_min_fast,
                atr_pct_min_slow,
                macd_eps,
                rsi_high,
                rsi_low,
            },
            taapi_url,
            gist_api_url,
            futures_api_url,
            include_futures,
            http_timeout,
        })
    }
}

/// Reads keys through a lookup, recording every problem instead of
/// stopping at the first one.
struct EnvReader<F> {
    lookup: F,
    errors: ConfigError,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn new(lookup: F) -> Self {
        Self {
            lookup,
            errors: ConfigError::default(),
        }
    }

    /// Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&mut self, key: &str) -> Option<String> {
        let value = self.optional(key);
        if value.is_none() {
            self.errors.missing(key);
        }
        value
    }

    fn required_parsed<T>(&mut self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.required(key)?;
        self.parse(key, &raw)
    }

    fn required_float(&mut self, key: &str, min: f64, max: f64) -> Option<f64> {
        let value: f64 = self.required_parsed(key)?;
        let problem = if !value.is_finite() {
            Some(format!("{value} is not a finite number"))
        } else if value < min {
            Some(format!("{value} is below {min}"))
        } else if value > max {
            Some(format!("{value} is above {max}"))
        } else {
            None
        };
        match problem {
            Some(reason) => {
                self.errors.invalid(key, reason);
                None
            }
            None => Some(value),
        }
    }

    fn optional_parsed<T>(&mut self, key: &str, default: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.optional(key).unwrap_or_else(|| default.to_string());
        self.parse(key, &raw)
    }

    fn optional_flag(&mut self, key: &str) -> Option<bool> {
        match self.optional(key).map(|v| v.to_lowercase()).as_deref() {
            None | Some("false" | "0" | "no") => Some(false),
            Some("true" | "1" | "yes") => Some(true),
            Some(other) => {
                self.errors
                    .invalid(key, format!("'{other}' is not a boolean"));
                None
            }
        }
    }

    fn parse<T>(&mut self, key: &str, raw: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.invalid(key, e.to_string());
                None
            }
        }
    }
}
