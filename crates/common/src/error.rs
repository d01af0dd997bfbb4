use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Upstream error from {service}: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Credentials rejected by {service} (HTTP {status})")]
    Auth { service: &'static str, status: u16 },

    #[error("{service}: {resource} not found")]
    NotFound {
        service: &'static str,
        resource: String,
    },

    #[error("Missing field '{field}' in {indicator} response")]
    MissingField { indicator: String, field: String },

    #[error("{indicator} field '{field}' out of range: {value}")]
    OutOfRange {
        indicator: String,
        field: String,
        value: f64,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Error::Upstream {
            service,
            message: message.into(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// First `max` characters of an upstream body, for error messages.
pub fn excerpt(body: &str, max: usize) -> String {
    let mut out: String = body.chars().take(max).collect();
    if body.chars().count() > max {
        out.push('…');
    }
    out
}

/// Every configuration problem found in one pass.
///
/// Collected in full before failing so an operator sees all missing and
/// malformed keys at once.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub missing: Vec<String>,
    /// `(key, reason)` pairs.
    pub invalid: Vec<(String, String)>,
}

impl ConfigError {
    pub fn missing(&mut self, key: &str) {
        self.missing.push(key.to_string());
    }

    pub fn invalid(&mut self, key: &str, reason: impl Into<String>) {
        self.invalid.push((key.to_string(), reason.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }

    /// A single-entry error for a value rejected outside of env loading.
    pub fn single_invalid(key: &str, reason: impl Into<String>) -> Self {
        let mut err = Self::default();
        err.invalid(key, reason);
        err
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing required keys: {}", self.missing.join(", ")));
        }
        if !self.invalid.is_empty() {
            let invalid: Vec<String> = self
                .invalid
                .iter()
                .map(|(key, reason)| format!("{key} ({reason})"))
                .collect();
            parts.push(format!("invalid values: {}", invalid.join(", ")));
        }
        if parts.is_empty() {
            return write!(f, "no problems recorded");
        }
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ConfigError {}
