use std::time::Duration;

use reqwest::Client;

use crate::error::{Result, RelayError};

/// Shared HTTP client for the Deepgram and Cloudinary relays.
///
/// No overall request timeout: uploads carry whole videos and the relays
/// never retry, so a slow transfer is left to finish.
pub fn http_client() -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .pool_idle_timeout(Some(Duration::from_secs(5)))
        .tcp_nodelay(true)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
        .map_err(|e| RelayError::Config(format!("Failed to build HTTP client: {}", e)))
}
