//! Finds hourly archive recordings whose published names are drifting Unix
//! timestamps, then downloads them with a cap on concurrent transfers.

pub mod anchor;
pub mod cli;
pub mod config;
pub mod coordinator;
pub mod day;
pub mod error;
pub mod fetch;
pub mod ledger;
pub mod locator;
pub mod probe;
pub mod run;

#[cfg(test)]
pub mod tests;

pub use crate::anchor::{readable_name, Anchor, DateRange, ResourceAddress};
pub use crate::config::FinderConfig;
pub use crate::coordinator::{Discovery, DiscoveryCoordinator};
pub use crate::day::{DayResult, DayScanner};
pub use crate::error::{FetchError, FinderError};
pub use crate::fetch::{BoundedFetcher, FetchReport, HttpRetriever, Retriever};
pub use crate::ledger::Ledger;
pub use crate::locator::{AdaptiveLocator, SearchWindow};
pub use crate::probe::{HttpProbe, Probe};
pub use crate::run::{save_listing, Finder, RunSummary};
