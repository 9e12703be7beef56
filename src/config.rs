use std::{net::SocketAddr, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_RATES_URL: &str = "https://api.exchangerate.host";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone)]
pub struct Config {
    pub rates_url: String,
    pub rates_access_key: Option<String>,
    pub request_timeout: Duration,
    pub listen_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rates_url = var("FXMARKUP_RATES_URL").unwrap_or_else(|| DEFAULT_RATES_URL.to_string());
        let rates_access_key = var("FXMARKUP_RATES_ACCESS_KEY");
        let timeout_secs = match var("FXMARKUP_TIMEOUT_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("Invalid FXMARKUP_TIMEOUT_SECS: {}", v))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let listen_addr = var("FXMARKUP_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr
            .trim()
            .parse::<SocketAddr>()
            .with_context(|| format!("Invalid FXMARKUP_LISTEN_ADDR: {}", listen_addr))?;

        Ok(Self {
            rates_url,
            rates_access_key,
            request_timeout: Duration::from_secs(timeout_secs),
            listen_addr,
        })
    }
}
