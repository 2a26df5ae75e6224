use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the store server, without the `/storage` suffix.
    pub store_url: String,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let poll_interval = match env::var("POLL_INTERVAL_MS") {
            Ok(raw) => {
                let millis: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid POLL_INTERVAL_MS: {raw:?}"))?;
                Duration::from_millis(millis.max(1))
            }
            Err(_) => defaults.poll_interval,
        };

        Ok(Self {
            store_url: env::var("STORE_URL").unwrap_or(defaults.store_url),
            poll_interval,
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:8080".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
