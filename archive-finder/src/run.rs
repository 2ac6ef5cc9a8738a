use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::anchor::{Anchor, DateRange};
use crate::config::FinderConfig;
use crate::coordinator::{Discovery, DiscoveryCoordinator};
use crate::fetch::{BoundedFetcher, FetchReport, HttpRetriever, Retriever};
use crate::locator::AdaptiveLocator;
use crate::probe::{HttpProbe, Probe};

/// Final counts reported at the end of every run, even an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub days: usize,
    pub empty_days: usize,
    pub found: usize,
    pub gaps: usize,
    pub probe_errors: u64,
    pub fetched: usize,
    pub failed: usize,
    pub skipped: usize,
    pub bytes: u64,
}

impl RunSummary {
    fn from_parts(discovery: &Discovery, probe_errors: u64, fetch: &FetchReport) -> Self {
        RunSummary {
            days: discovery.days,
            empty_days: discovery.empty_days,
            found: discovery.found,
            gaps: discovery.gaps,
            probe_errors,
            fetched: fetch.fetched,
            failed: fetch.failed,
            skipped: fetch.skipped,
            bytes: fetch.bytes,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Days searched: {} ({} with no files)", self.days, self.empty_days)?;
        writeln!(f, "Files found: {} ({} gaps)", self.found, self.gaps)?;
        writeln!(f, "Probe errors: {}", self.probe_errors)?;
        write!(
            f,
            "Downloaded: {} ({} bytes), failed: {}, not started: {}",
            self.fetched, self.bytes, self.failed, self.skipped
        )
    }
}

/// The probing half of a run, wired to its collaborators.
pub struct Finder {
    config: FinderConfig,
    probe: Arc<dyn Probe>,
    retriever: Arc<dyn Retriever>,
    cancel: CancellationToken,
}

impl Finder {
    /// HTTP-backed finder. Fails only if the configuration or clients are unusable.
    pub fn new(config: FinderConfig, cancel: CancellationToken) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let probe = Arc::new(HttpProbe::new(&config)?);
        let retriever = Arc::new(HttpRetriever::new(&config)?);
        Ok(Finder::with_parts(config, probe, retriever, cancel))
    }

    pub fn with_parts(
        config: FinderConfig,
        probe: Arc<dyn Probe>,
        retriever: Arc<dyn Retriever>,
        cancel: CancellationToken,
    ) -> Self {
        Finder {
            config,
            probe,
            retriever,
            cancel,
        }
    }

    pub async fn discover(&self, range: &DateRange) -> Result<Discovery> {
        let locator = AdaptiveLocator::new(self.probe.clone(), &self.config, self.cancel.clone())?;
        let coordinator = DiscoveryCoordinator::new(Arc::new(locator), self.config.slots_per_day);
        Ok(coordinator.discover(range).await)
    }

    /// Discover over `range`, then download everything found.
    pub async fn run(&self, range: &DateRange) -> Result<RunSummary> {
        info!(
            "searching {} through {} at {}",
            range.start(),
            range.end(),
            self.config.base_url
        );
        let discovery = self.discover(range).await?;

        let fetcher =
            BoundedFetcher::new(self.retriever.clone(), &self.config, self.cancel.clone())?;
        let report = fetcher.fetch_all(discovery.ledger.snapshot().await).await?;

        Ok(RunSummary::from_parts(
            &discovery,
            self.probe.error_count(),
            &report,
        ))
    }

    /// Discovery only; nothing is downloaded.
    pub async fn list(&self, range: &DateRange) -> Result<(Vec<Anchor>, RunSummary)> {
        let discovery = self.discover(range).await?;
        let summary = RunSummary::from_parts(
            &discovery,
            self.probe.error_count(),
            &FetchReport::default(),
        );
        Ok((discovery.ledger.sorted().await, summary))
    }
}

/// Write anchors as a pretty JSON array.
pub fn save_listing<P: AsRef<Path>>(anchors: &[Anchor], path: P) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(anchors).context("Failed to serialize listing")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write listing to {}", path.display()))?;
    Ok(())
}
