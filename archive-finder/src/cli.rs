//! Argument handling shared by the binaries.

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use chrono_tz::Tz;
use clap::Args;
use log::warn;
use tokio_util::sync::CancellationToken;

use crate::anchor::DateRange;
use crate::config::FinderConfig;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First day to search (YYYY-MM-DD or MM/DD/YYYY)
    pub start_date: Option<String>,

    /// Last day to search, inclusive
    pub end_date: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Archive location, e.g. https://kdhx.org/archive/files
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory downloaded files are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// IANA time zone the archive schedule follows
    #[arg(long)]
    pub time_zone: Option<String>,

    /// Maximum simultaneous downloads
    #[arg(long)]
    pub max_concurrent: Option<usize>,
}

impl ConfigArgs {
    /// Config file (or defaults) with flags applied on top.
    pub fn resolve(&self) -> Result<FinderConfig> {
        let mut config = match &self.config {
            Some(path) => FinderConfig::load(path)?,
            None => FinderConfig::default(),
        };
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(time_zone) = &self.time_zone {
            config.time_zone = time_zone.clone();
        }
        if let Some(max) = self.max_concurrent {
            config.max_concurrent_fetches = max;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
}

impl RangeArgs {
    /// The requested range, or today through tomorrow when either date is
    /// missing, unparsable, or the two are reversed.
    pub fn resolve(&self, tz: Tz) -> DateRange {
        let start = self.start_date.as_deref().and_then(parse_date);
        let end = self.end_date.as_deref().and_then(parse_date);
        if let (Some(start), Some(end)) = (start, end) {
            match DateRange::new(start, end) {
                Ok(range) => return range,
                Err(e) => warn!("{}", e),
            }
        }
        let range = DateRange::default_for(tz);
        warn!(
            "Usage: <START_DATE> <END_DATE>; searching {} through {} instead",
            range.start(),
            range.end()
        );
        range
    }
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Token that fires on Ctrl-C so a run can wind down early.
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing in-flight work");
            trigger.cancel();
        }
    });
    cancel
}
