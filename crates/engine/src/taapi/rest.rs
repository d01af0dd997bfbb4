use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use common::{
    excerpt, ConfigError, Error, Indicator, IndicatorRequest, IndicatorResult, IndicatorSource,
    Result, Secret,
};

const SERVICE: &str = "taapi";

/// REST client for the TAAPI indicator service. One GET per indicator.
pub struct TaapiClient {
    secret: Secret,
    exchange: String,
    base_url: Url,
    http: Client,
}

impl TaapiClient {
    pub fn new(secret: Secret, exchange: impl Into<String>, base_url: Url, http: Client) -> Self {
        Self {
            secret,
            exchange: exchange.into(),
            base_url,
            http,
        }
    }

    fn endpoint(&self, indicator: Indicator) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            indicator.endpoint()
        )
    }
}

#[async_trait]
impl IndicatorSource for TaapiClient {
    async fn fetch(&self, request: &IndicatorRequest) -> Result<IndicatorResult> {
        if request.symbol.trim().is_empty() {
            return Err(ConfigError::single_invalid("SYMBOL", "must not be empty").into());
        }

        let mut query: Vec<(&str, &str)> = vec![
            ("secret", self.secret.expose()),
            ("exchange", self.exchange.as_str()),
            ("symbol", request.symbol.as_str()),
            ("interval", request.timeframe.as_str()),
        ];
        query.extend_from_slice(request.indicator.params());

        debug!(
            indicator = %request.indicator,
            symbol = %request.symbol,
            interval = %request.timeframe,
            "Requesting indicator from TAAPI"
        );

        let resp = self
            .http
            .get(self.endpoint(request.indicator))
            .query(&query)
            .send()
            .await
            .map_err(|e| transport_error(request, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| transport_error(request, e))?;

        if !status.is_success() {
            return Err(Error::upstream(
                SERVICE,
                format!(
                    "HTTP {status} for {} {}: {}",
                    request.indicator,
                    request.timeframe,
                    excerpt(&body, 200)
                ),
            ));
        }

        parse_indicator(request.indicator, &body)
    }
}

/// `without_url` keeps the secret query parameter out of error text.
fn transport_error(request: &IndicatorRequest, e: reqwest::Error) -> Error {
    Error::upstream(
        SERVICE,
        format!(
            "request for {} {} failed: {}",
            request.indicator,
            request.timeframe,
            e.without_url()
        ),
    )
}

/// Parse a TAAPI response body into its numeric fields.
///
/// The service reports some failures with a 2xx status and a
/// `{"status": "error", "message": ...}` payload; those surface as upstream
/// errors too. Every field in [`Indicator::fields`] must be present and
/// numeric, otherwise `MissingField`. Other non-numeric fields are ignored.
pub fn parse_indicator(indicator: Indicator, body: &str) -> Result<IndicatorResult> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        Error::upstream(SERVICE, format!("unparseable {indicator} response: {e}"))
    })?;

    let Value::Object(map) = value else {
        return Err(Error::upstream(
            SERVICE,
            format!("expected a JSON object for {indicator}, got: {}", excerpt(body, 200)),
        ));
    };

    if map.get("status").and_then(Value::as_str) == Some("error") {
        let message = map
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(Error::upstream(SERVICE, format!("{indicator}: {message}")));
    }

    let values: BTreeMap<String, f64> = map
        .iter()
        .filter_map(|(key, v)| v.as_f64().map(|n| (key.clone(), n)))
        .collect();

    if let Some(field) = indicator.fields().iter().find(|f| !values.contains_key(**f)) {
        return Err(Error::MissingField {
            indicator: indicator.to_string(),
            field: field.to_string(),
        });
    }

    Ok(IndicatorResult::new(indicator, values))
}
