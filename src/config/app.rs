// src/config/app.rs
use anyhow::{Context, Result};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::ingest::fetch::DEFAULT_FETCH_TIMEOUT;

pub const DEFAULT_PORT: u16 = 4000;

/// Server settings read at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub fetch_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(raw) = get("PORT").filter(|v| !v.trim().is_empty()) {
            match raw.trim().parse::<u16>() {
                Ok(p) => cfg.port = p,
                Err(_) => tracing::warn!(value = %raw, "invalid PORT, using {DEFAULT_PORT}"),
            }
        }

        if let Some(raw) = get("BIND_ADDR").filter(|v| !v.trim().is_empty()) {
            cfg.bind_addr = raw
                .trim()
                .parse()
                .with_context(|| format!("BIND_ADDR is not an IP address: {raw}"))?;
        }

        if let Some(raw) = get("FEED_FETCH_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("FEED_FETCH_TIMEOUT_SECS is not a number: {raw}"))?;
            anyhow::ensure!(secs > 0, "FEED_FETCH_TIMEOUT_SECS must be positive");
            cfg.fetch_timeout = Duration::from_secs(secs);
        }

        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
