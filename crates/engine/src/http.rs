use std::time::Duration;

use reqwest::Client;

use common::{Error, Result};

pub const USER_AGENT: &str = concat!("layerfeed/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every outbound call of a run.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .use_rustls_tls()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::upstream("http", format!("client setup failed: {e}")))
}
