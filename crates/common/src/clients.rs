use async_trait::async_trait;
use url::Url;

use crate::{IndicatorRequest, IndicatorResult, Result};

/// Abstraction over the indicator service.
///
/// `TaapiClient` implements this against the live API; tests substitute
/// a mock server or an in-memory source.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    /// Fetch one indicator. One outbound call, no retries.
    async fn fetch(&self, request: &IndicatorRequest) -> Result<IndicatorResult>;
}

/// Abstraction over the single-file store the feed is published to.
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Replace the whole content of `filename`. Idempotent: putting the same
    /// content twice leaves the store in the same state.
    async fn put(&self, filename: &str, content: &str) -> Result<StoredFile>;
}

/// What the store reports back after a successful put.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub raw_url: Url,
    /// Content as echoed by the store, when it returns it.
    pub content: Option<String>,
}
