use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Setup failures that abort a run before any probing starts.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("local time {0} does not exist in the reference time zone")]
    AmbiguousLocalTime(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// A single failed transfer. Contained by the fetcher, never propagated.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("transfer of {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
