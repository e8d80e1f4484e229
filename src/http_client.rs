use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::Config;

const USER_AGENT: &str = concat!("ksfa_terminal/", env!("CARGO_PKG_VERSION"));

/// One client per process, built at startup and handed to whoever needs it.
pub fn build_http_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.http_timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("failed to build http client")
}
