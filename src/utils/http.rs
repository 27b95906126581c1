use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client,
};
use std::time::Duration;
use teloxide::Bot;

use crate::error::BotResult;

pub const DEFAULT_USER_AGENT: &str = concat!("telarr/", env!("CARGO_PKG_VERSION"));

/// Bot on teloxide's own client builder, which keeps its timeouts above the long-polling timeout.
pub fn create_telegram_bot(token: impl Into<String>) -> BotResult<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .pool_idle_timeout(Duration::from_secs(60))
        .tcp_keepalive(Duration::from_secs(30))
        .user_agent(DEFAULT_USER_AGENT)
        .build()
        .map_err(anyhow::Error::from)?;
    debug!("Telegram HTTP client built");

    Ok(Bot::with_client(token, client))
}

/// Client shared by the Radarr and Sonarr APIs.
pub fn create_catalog_client() -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    let builder = Client::builder()
        .timeout(Duration::from_secs(20))
        .connect_timeout(Duration::from_secs(10))
        .default_headers(headers)
        .user_agent(DEFAULT_USER_AGENT);

    build_client(builder)
}

fn build_client(builder: reqwest::ClientBuilder) -> Result<Client, reqwest::Error> {
    let client = builder.build()?;
    debug!("HTTP client built");
    Ok(client)
}
