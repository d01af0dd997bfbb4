use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use common::{excerpt, Error, FeedStore, Result, Secret, StoredFile};

const SERVICE: &str = "gist";
const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";

/// Gist-backed feed store. Each `put` replaces one file of one gist with a
/// single PATCH; no merge with the previous content is attempted.
///
/// GitHub rejects requests without a `User-Agent`; the supplied client is
/// expected to set one.
pub struct GistClient {
    gist_id: String,
    token: Secret,
    base_url: Url,
    http: Client,
}

impl GistClient {
    pub fn new(gist_id: impl Into<String>, token: Secret, base_url: Url, http: Client) -> Self {
        Self {
            gist_id: gist_id.into(),
            token,
            base_url,
            http,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/gists/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.gist_id
        )
    }
}

#[async_trait]
impl FeedStore for GistClient {
    async fn put(&self, filename: &str, content: &str) -> Result<StoredFile> {
        let body = json!({ "files": { filename: { "content": content } } });

        debug!(gist_id = %self.gist_id, file = filename, bytes = content.len(), "Updating gist");

        let resp = self
            .http
            .patch(self.endpoint())
            .header(AUTHORIZATION, format!("token {}", self.token.expose()))
            .header(ACCEPT, ACCEPT_GITHUB_JSON)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("reading response failed: {e}")))?;

        match status.as_u16() {
            401 | 403 => Err(Error::Auth {
                service: SERVICE,
                status: status.as_u16(),
            }),
            404 => Err(Error::NotFound {
                service: SERVICE,
                resource: format!("gist '{}'", self.gist_id),
            }),
            _ if !status.is_success() => Err(Error::upstream(
                SERVICE,
                format!("HTTP {status}: {}", excerpt(&text, 200)),
            )),
            _ => stored_file(filename, &text),
        }
    }
}

/// Pull the raw URL (and echoed content) of `filename` out of a gist response.
pub fn stored_file(filename: &str, body: &str) -> Result<StoredFile> {
    let gist: GistResponse = serde_json::from_str(body)
        .map_err(|e| Error::upstream(SERVICE, format!("unparseable response: {e}")))?;

    let file = gist.files.get(filename).ok_or_else(|| {
        Error::upstream(SERVICE, format!("response does not list file '{filename}'"))
    })?;

    let raw_url = file
        .raw_url
        .as_deref()
        .ok_or_else(|| Error::upstream(SERVICE, format!("file '{filename}' has no raw_url")))?;

    let raw_url = Url::parse(raw_url)
        .map_err(|e| Error::upstream(SERVICE, format!("invalid raw_url '{raw_url}': {e}")))?;

    Ok(StoredFile {
        raw_url,
        content: file.content.clone(),
    })
}

// ─── Response types ───────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Deserialize)]
struct GistFile {
    raw_url: Option<String>,
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_raw_url_for_named_file() {
        let body = r#"{
            "id": "abc123",
            "files": {
                "layer_feed.json": {
                    "filename": "layer_feed.json",
                    "raw_url": "https://gist.githubusercontent.com/u/abc123/raw/f00/layer_feed.json",
                    "content": "{}"
                },
                "other.txt": { "raw_url": "https://example.com/other.txt" }
            }
        }"#;
        let stored = stored_file("layer_feed.json", body).unwrap();
        assert_eq!(
            stored.raw_url.as_str(),
            "https://gist.githubusercontent.com/u/abc123/raw/f00/layer_feed.json"
        );
        assert_eq!(stored.content.as_deref(), Some("{}"));
    }

    #[test]
    fn missing_file_is_upstream_error() {
        let err = stored_file("layer_feed.json", r#"{"files": {}}"#).unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }

    #[test]
    fn missing_raw_url_is_upstream_error() {
        let body = r#"{"files": {"layer_feed.json": {"content": "{}"}}}"#;
        let err = stored_file("layer_feed.json", body).unwrap_err();
        assert!(err.to_string().contains("no raw_url"));
    }

    #[test]
    fn endpoint_targets_gist_by_id() {
        let client = GistClient::new(
            "abc123",
            Secret::new("t"),
            Url::parse("https://api.github.com").unwrap(),
            Client::new(),
        );
        assert_eq!(client.endpoint(), "https://api.github.com/gists/abc123");
    }
}
