//! Existence checks for candidate timestamps.
//!
//! A probe only ever answers "present" or "absent". Transport errors and
//! timeouts are reported as absent, same as a 404, so a flaky connection
//! can make a search miss a file. The error count is kept separately so an
//! operator can tell the two apart after the fact. Outcomes are logged by
//! the caller, which knows which day a timestamp belongs to.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::anchor::ResourceAddress;
use crate::config::FinderConfig;
use crate::error::FinderError;

#[async_trait]
pub trait Probe: Send + Sync {
    /// True only when the remote side unambiguously reports the resource exists.
    async fn probe(&self, timestamp: i64) -> bool;

    /// Probes that failed on transport rather than on a negative answer.
    fn error_count(&self) -> u64 {
        0
    }
}

/// HEAD-request probe against the archive server.
#[derive(Debug)]
pub struct HttpProbe {
    client: reqwest::Client,
    address: ResourceAddress,
    errors: AtomicU64,
}

impl HttpProbe {
    pub fn new(config: &FinderConfig) -> Result<Self, FinderError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.probe_timeout())
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build()?;
        Ok(HttpProbe {
            client,
            address: ResourceAddress::new(&config.base_url, &config.extension),
            errors: AtomicU64::new(0),
        })
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, timestamp: i64) -> bool {
        let url = self.address.url_for(timestamp);
        match self.client.head(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}
