use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::anchor::Anchor;
use crate::config::FinderConfig;
use crate::error::FetchError;
use crate::fetch::Retriever;
use crate::probe::Probe;

pub const BASE_URL: &str = "http://archive.test/files";

/// UTC keeps day boundaries easy to reason about in tests
pub fn test_config() -> FinderConfig {
    FinderConfig {
        base_url: BASE_URL.to_string(),
        time_zone: "UTC".to_string(),
        ..FinderConfig::default()
    }
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Epoch seconds of UTC midnight for `day`
pub fn midnight(day: NaiveDate) -> i64 {
    day.and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp()
}

/// Timestamps of a day published every hour starting `offset` seconds after midnight
pub fn hourly_schedule(day: NaiveDate, offset: i64) -> Vec<i64> {
    (0..24).map(|k| midnight(day) + offset + 3600 * k).collect()
}

/// Probe that answers from a fixed set and remembers every question
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    present: HashSet<i64>,
    calls: Mutex<Vec<i64>>,
}

impl ScriptedProbe {
    pub fn with_present<I: IntoIterator<Item = i64>>(present: I) -> Self {
        ScriptedProbe {
            present: present.into_iter().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_present(&self, timestamp: i64) -> bool {
        self.present.contains(&timestamp)
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    async fn probe(&self, timestamp: i64) -> bool {
        self.calls.lock().unwrap().push(timestamp);
        self.present.contains(&timestamp)
    }
}

/// Retriever that tracks how many transfers overlap
#[derive(Debug, Default)]
pub struct RecordingRetriever {
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    delay: Duration,
    fail_odd: bool,
    destinations: Mutex<Vec<PathBuf>>,
}

impl RecordingRetriever {
    pub fn new(delay: Duration) -> Self {
        RecordingRetriever {
            delay,
            ..RecordingRetriever::default()
        }
    }

    /// Odd timestamps fail with a 503
    pub fn failing_odd(delay: Duration) -> Self {
        RecordingRetriever {
            delay,
            fail_odd: true,
            ..RecordingRetriever::default()
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn destinations(&self) -> Vec<PathBuf> {
        self.destinations.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for RecordingRetriever {
    async fn retrieve(&self, anchor: &Anchor, dest: &Path) -> Result<u64, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.destinations.lock().unwrap().push(dest.to_path_buf());

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_odd && anchor.timestamp % 2 != 0 {
            return Err(FetchError::Status {
                url: anchor.url.clone(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(100)
    }
}
