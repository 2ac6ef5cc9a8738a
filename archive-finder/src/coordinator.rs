use std::sync::Arc;

use log::{error, info};
use tokio::task::JoinSet;

use crate::anchor::DateRange;
use crate::day::DayScanner;
use crate::ledger::Ledger;
use crate::locator::AdaptiveLocator;

/// What discovery over a date range produced.
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Every anchor found, each day's anchors contiguous and in order.
    pub ledger: Ledger,
    pub found: usize,
    pub days: usize,
    pub empty_days: usize,
    pub gaps: usize,
}

/// Runs one [`DayScanner`] per day of the range, all at once.
pub struct DiscoveryCoordinator {
    locator: Arc<AdaptiveLocator>,
    slots_per_day: u32,
}

impl DiscoveryCoordinator {
    pub fn new(locator: Arc<AdaptiveLocator>, slots_per_day: u32) -> Self {
        DiscoveryCoordinator {
            locator,
            slots_per_day,
        }
    }

    /// Returns once every day task has finished.
    pub async fn discover(&self, range: &DateRange) -> Discovery {
        let mut discovery = Discovery::default();
        let mut tasks = JoinSet::new();

        for day in range.days() {
            let scanner = DayScanner::new(self.locator.clone(), day, self.slots_per_day);
            let ledger = discovery.ledger.clone();
            tasks.spawn(async move {
                let result = scanner.run().await;
                let gaps = result.gaps.len();
                let empty = result.anchors.is_empty();
                ledger.append(result.anchors).await;
                (gaps, empty)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((gaps, empty)) => {
                    discovery.days += 1;
                    discovery.gaps += gaps;
                    if empty {
                        discovery.empty_days += 1;
                    }
                }
                Err(e) => error!("day task failed: {}", e),
            }
        }

        discovery.found = discovery.ledger.len().await;
        info!(
            "discovery finished: {} files over {} days ({} gaps)",
            discovery.found,
            discovery.days,
            discovery.gaps
        );
        discovery
    }
}
