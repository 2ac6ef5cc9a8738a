//! Downloads every discovered file with a cap on simultaneous transfers.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::anchor::{readable_name, Anchor};
use crate::config::FinderConfig;
use crate::error::{FetchError, FinderError};

#[async_trait]
pub trait Retriever: Send + Sync {
    /// Store the body behind `anchor.url` at `dest`, returning the byte count.
    async fn retrieve(&self, anchor: &Anchor, dest: &Path) -> Result<u64, FetchError>;
}

/// GETs the file and streams it to disk.
///
/// The body goes to `<dest>.part` first and is renamed on success, so a
/// failed transfer leaves nothing at `dest`.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
}

impl HttpRetriever {
    pub fn new(config: &FinderConfig) -> Result<Self, FinderError> {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(config.fetch_timeout())
            .pool_max_idle_per_host(config.max_connections_per_host)
            .build()?;
        Ok(HttpRetriever { client })
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

async fn stream_body(
    mut response: reqwest::Response,
    url: &str,
    part: &Path,
) -> Result<u64, FetchError> {
    let io_error = |source: std::io::Error| FetchError::Io {
        path: part.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::create(part).await.map_err(io_error)?;
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?
    {
        file.write_all(&chunk).await.map_err(io_error)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io_error)?;
    Ok(written)
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(&self, anchor: &Anchor, dest: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(&anchor.url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: anchor.url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: anchor.url.clone(),
                status,
            });
        }

        let part = partial_path(dest);
        let written = match stream_body(response, &anchor.url, &part).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&part, dest)
            .await
            .map_err(|source| FetchError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
        Ok(written)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub fetched: usize,
    pub failed: usize,
    /// Never started because the run was cancelled.
    pub skipped: usize,
    pub bytes: u64,
}

pub struct BoundedFetcher {
    retriever: Arc<dyn Retriever>,
    permits: Arc<Semaphore>,
    output_dir: PathBuf,
    extension: String,
    tz: Tz,
    cancel: CancellationToken,
}

impl BoundedFetcher {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        config: &FinderConfig,
        cancel: CancellationToken,
    ) -> Result<Self, FinderError> {
        Ok(BoundedFetcher {
            retriever,
            permits: Arc::new(Semaphore::new(config.max_concurrent_fetches)),
            output_dir: config.output_dir.clone(),
            extension: config.extension.trim_start_matches('.').to_string(),
            tz: config.tz()?,
            cancel,
        })
    }

    /// Local file an anchor is saved to, named by its wall-clock time.
    pub fn destination(&self, anchor: &Anchor) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}",
            readable_name(anchor.timestamp, self.tz),
            self.extension
        ))
    }

    /// Like [`destination`](Self::destination), but falls back to a name
    /// carrying the timestamp when the wall-clock name is already taken,
    /// which happens in the repeated hour when clocks fall back.
    fn unclaimed_destination(&self, anchor: &Anchor, claimed: &mut HashSet<PathBuf>) -> PathBuf {
        let dest = self.destination(anchor);
        if claimed.insert(dest.clone()) {
            return dest;
        }
        let fallback = self.output_dir.join(format!(
            "{} ({}).{}",
            readable_name(anchor.timestamp, self.tz),
            anchor.timestamp,
            self.extension
        ));
        claimed.insert(fallback.clone());
        fallback
    }

    /// Download every anchor once. Individual failures are logged and
    /// counted; only failing to create the output directory is an error.
    pub async fn fetch_all(&self, anchors: Vec<Anchor>) -> Result<FetchReport> {
        let mut report = FetchReport::default();
        if anchors.is_empty() {
            info!("nothing to download");
            return Ok(report);
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| {
                format!(
                    "Failed to create output directory: {}",
                    self.output_dir.display()
                )
            })?;

        let mut tasks = JoinSet::new();
        let mut seen = HashSet::new();
        let mut claimed = HashSet::new();
        for anchor in anchors {
            if !seen.insert(anchor.timestamp) {
                debug!("skipping repeated {}", anchor.url);
                continue;
            }
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                permit = self.permits.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                report.skipped += 1;
                continue;
            };

            let retriever = self.retriever.clone();
            let dest = self.unclaimed_destination(&anchor, &mut claimed);
            tasks.spawn(async move {
                info!("starting {}", anchor.url);
                let outcome = retriever.retrieve(&anchor, &dest).await;
                drop(permit);
                (anchor, dest, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((anchor, dest, Ok(bytes))) => {
                    report.fetched += 1;
                    report.bytes += bytes;
                    info!("downloaded {} to {}", anchor.url, dest.display());
                }
                Ok((_, _, Err(e))) => {
                    report.failed += 1;
                    warn!("download failed: {}", e);
                }
                Err(e) => {
                    report.failed += 1;
                    error!("download task failed: {}", e);
                }
            }
        }

        if report.skipped > 0 {
            warn!("cancelled, {} downloads never started", report.skipped);
        }
        Ok(report)
    }
}
