use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::FinderError;

const MAX_CADENCE_SECS: i64 = 86_400;

/// Everything a run needs besides the date range.
///
/// Loaded from a JSON file when one is given; any field left out falls back
/// to the defaults below, and command line flags override both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub base_url: String,
    pub extension: String,
    /// IANA name of the zone the station's schedule is kept in.
    pub time_zone: String,
    pub output_dir: PathBuf,
    pub slots_per_day: u32,
    pub cadence_secs: i64,
    /// Seconds before the hourly guess where the fine scan begins.
    pub early_drift_secs: i64,
    /// Seconds past the hourly guess where the fine scan gives up.
    ///
    /// Together with `early_drift_secs` this must stay under one cadence so
    /// neighbouring slots never search the same second.
    pub late_drift_secs: i64,
    pub probe_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub max_concurrent_fetches: usize,
    pub max_connections_per_host: usize,
}

impl Default for FinderConfig {
    fn default() -> Self {
        FinderConfig {
            base_url: "https://kdhx.org/archive/files".to_string(),
            extension: "mp3".to_string(),
            time_zone: "America/Chicago".to_string(),
            output_dir: PathBuf::from("archive"),
            slots_per_day: 24,
            cadence_secs: 3600,
            early_drift_secs: 3,
            late_drift_secs: 3596,
            probe_timeout_secs: 10,
            fetch_timeout_secs: 15 * 60,
            max_concurrent_fetches: 10,
            max_connections_per_host: 10,
        }
    }
}

impl FinderConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<FinderConfig> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let config: FinderConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FinderError> {
        if self.base_url.trim().is_empty() {
            return Err(FinderError::InvalidConfig("base_url is empty".to_string()));
        }
        if self.cadence_secs <= 0 || self.cadence_secs > MAX_CADENCE_SECS {
            return Err(FinderError::InvalidConfig(format!(
                "cadence_secs must be between 1 and {}",
                MAX_CADENCE_SECS
            )));
        }
        if self.slots_per_day == 0 {
            return Err(FinderError::InvalidConfig(
                "slots_per_day must be at least 1".to_string(),
            ));
        }
        if self.early_drift_secs < 0 || self.late_drift_secs < 0 {
            return Err(FinderError::InvalidConfig(
                "drift bounds cannot be negative".to_string(),
            ));
        }
        let window = self.early_drift_secs.checked_add(self.late_drift_secs);
        if window.map_or(true, |window| window >= self.cadence_secs) {
            return Err(FinderError::InvalidConfig(
                "early_drift_secs + late_drift_secs must be shorter than the cadence".to_string(),
            ));
        }
        if self.probe_timeout_secs == 0 || self.fetch_timeout_secs == 0 {
            return Err(FinderError::InvalidConfig(
                "timeouts must be at least one second".to_string(),
            ));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(FinderError::InvalidConfig(
                "max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, FinderError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| FinderError::UnknownTimeZone(self.time_zone.clone()))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}
