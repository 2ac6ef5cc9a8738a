//! Coarse-then-fine search for the next published timestamp.
//!
//! Files show up roughly once per cadence (an hour), but the exact second
//! drifts. The locator first checks the exact expected instant, which is a
//! single probe when the schedule held, and only then walks a bounded
//! one-second window around it. Every search is confined to one local day.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use chrono_tz::Tz;
use log::debug;
use tokio_util::sync::CancellationToken;

use crate::anchor::{first_hour_bounds, local_hour_start, Anchor, ResourceAddress};
use crate::config::FinderConfig;
use crate::error::FinderError;
use crate::probe::Probe;

/// Ordered candidate timestamps, `start..=end` every `step` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl SearchWindow {
    pub fn fine(start: i64, end: i64) -> Self {
        SearchWindow {
            start,
            end,
            step: 1,
        }
    }

    pub fn candidates(&self) -> impl Iterator<Item = i64> {
        let step = self.step.max(1) as usize;
        (self.start..=self.end).step_by(step)
    }
}

/// Epoch bounds of one local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySpan {
    pub day: NaiveDate,
    /// Local midnight.
    pub start: i64,
    /// Local 01:00, the end of the first-file scan.
    pub first_hour_end: i64,
    /// The next local midnight; nothing at or past it belongs to this day.
    pub end: i64,
}

impl DaySpan {
    pub fn new(day: NaiveDate, tz: Tz) -> Result<Self, FinderError> {
        let (start, first_hour_end) = first_hour_bounds(day, tz)?;
        let next = day
            .checked_add_days(Days::new(1))
            .ok_or_else(|| FinderError::AmbiguousLocalTime(format!("{} + 1 day", day)))?;
        let end = local_hour_start(next, 0, tz)?;
        Ok(DaySpan {
            day,
            start,
            first_hour_end,
            end,
        })
    }
}

pub struct AdaptiveLocator {
    probe: Arc<dyn Probe>,
    address: ResourceAddress,
    tz: Tz,
    cadence: i64,
    early_drift: i64,
    late_drift: i64,
    cancel: CancellationToken,
}

impl AdaptiveLocator {
    pub fn new(
        probe: Arc<dyn Probe>,
        config: &FinderConfig,
        cancel: CancellationToken,
    ) -> Result<Self, FinderError> {
        Ok(AdaptiveLocator {
            probe,
            address: ResourceAddress::new(&config.base_url, &config.extension),
            tz: config.tz()?,
            cadence: config.cadence_secs,
            early_drift: config.early_drift_secs,
            late_drift: config.late_drift_secs,
            cancel,
        })
    }

    pub fn tz(&self) -> Tz {
        self.tz
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn day_span(&self, day: NaiveDate) -> Result<DaySpan, FinderError> {
        DaySpan::new(day, self.tz)
    }

    /// Where the file `slots_ahead` cadences after `anchor` should be.
    pub fn expected_after(&self, anchor: &Anchor, slots_ahead: u32) -> Option<i64> {
        self.cadence
            .checked_mul(i64::from(slots_ahead.max(1)))
            .and_then(|offset| anchor.timestamp.checked_add(offset))
    }

    async fn check(&self, span: &DaySpan, timestamp: i64) -> bool {
        let present = self.probe.probe(timestamp).await;
        debug!(
            "[{}] {} {}",
            span.day,
            if present { "found" } else { "absent" },
            timestamp
        );
        present
    }

    /// Probe the window in order and return the earliest hit.
    ///
    /// `skip` names a timestamp already known to be absent. Returns `None` on
    /// exhaustion or when the run has been cancelled.
    pub async fn scan(&self, span: &DaySpan, window: SearchWindow, skip: Option<i64>) -> Option<i64> {
        for candidate in window.candidates() {
            if self.cancel.is_cancelled() {
                return None;
            }
            if Some(candidate) == skip {
                continue;
            }
            if self.check(span, candidate).await {
                return Some(candidate);
            }
        }
        None
    }

    /// Window walked when the exact `expected` instant is absent, cut off at
    /// the end of the day.
    pub fn fallback_window(&self, span: &DaySpan, expected: i64) -> SearchWindow {
        let end = expected.saturating_add(self.late_drift).min(span.end - 1);
        SearchWindow::fine(expected.saturating_sub(self.early_drift), end)
    }

    /// Second-by-second scan of the first local hour of the day.
    pub async fn find_first(&self, span: &DaySpan) -> Option<Anchor> {
        let window = SearchWindow::fine(span.start, span.first_hour_end - 1);
        debug!(
            "[{}] scanning first hour {}..={}",
            span.day, window.start, window.end
        );
        self.scan(span, window, None)
            .await
            .map(|timestamp| self.address.anchor(timestamp))
    }

    /// The file expected `slots_ahead` cadences after `anchor`.
    ///
    /// Slots skipped as gaps still count toward `slots_ahead`, so the
    /// expectation stays pinned to the last confirmed timestamp. Expectations
    /// past the end of the day find nothing.
    pub async fn find_next(&self, span: &DaySpan, anchor: &Anchor, slots_ahead: u32) -> Option<Anchor> {
        let expected = self.expected_after(anchor, slots_ahead)?;
        if expected >= span.end || self.cancel.is_cancelled() {
            return None;
        }
        if self.check(span, expected).await {
            return Some(self.address.anchor(expected));
        }
        let window = self.fallback_window(span, expected);
        self.scan(span, window, Some(expected))
            .await
            .map(|timestamp| self.address.anchor(timestamp))
    }
}
