use std::sync::Arc;

use chrono::NaiveDate;
use log::{info, warn};

use crate::anchor::{readable_name, Anchor};
use crate::locator::{AdaptiveLocator, DaySpan};

/// Everything found for one calendar day, in discovery (= chronological) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayResult {
    pub day: NaiveDate,
    pub anchors: Vec<Anchor>,
    /// Expected timestamps of slots nothing was found for.
    pub gaps: Vec<i64>,
}

impl DayResult {
    fn empty(day: NaiveDate) -> Self {
        DayResult {
            day,
            anchors: Vec::new(),
            gaps: Vec::new(),
        }
    }
}

#[derive(Debug)]
enum ScanState {
    SeekFirst,
    /// `missed` counts slots skipped since `last` was found.
    SeekSlot {
        slot: u32,
        last: Anchor,
        missed: u32,
    },
    Done,
}

/// Walks one day's slots: the first file by linear scan, the rest chained
/// off the most recent confirmed anchor.
pub struct DayScanner {
    locator: Arc<AdaptiveLocator>,
    day: NaiveDate,
    slots: u32,
}

impl DayScanner {
    pub fn new(locator: Arc<AdaptiveLocator>, day: NaiveDate, slots: u32) -> Self {
        DayScanner { locator, day, slots }
    }

    pub async fn run(self) -> DayResult {
        let day = self.day;
        let tz = self.locator.tz();
        let mut result = DayResult::empty(day);

        let span = match self.locator.day_span(day) {
            Ok(span) => span,
            Err(e) => {
                warn!("[{}] cannot search day: {}", day, e);
                return result;
            }
        };

        info!("[{}] searching day", day);

        let mut state = ScanState::SeekFirst;
        loop {
            if self.locator.is_cancelled() {
                warn!("[{}] cancelled after {} files", day, result.anchors.len());
                break;
            }

            state = match state {
                ScanState::SeekFirst => match self.locator.find_first(&span).await {
                    Some(anchor) => {
                        info!(
                            "[{}] found first file at {} - {}",
                            day,
                            anchor.timestamp,
                            readable_name(anchor.timestamp, tz)
                        );
                        result.anchors.push(anchor.clone());
                        ScanState::SeekSlot {
                            slot: 1,
                            last: anchor,
                            missed: 0,
                        }
                    }
                    None if self.locator.is_cancelled() => ScanState::Done,
                    None => {
                        warn!("[{}] no file in the first hour, skipping day", day);
                        ScanState::Done
                    }
                },
                ScanState::SeekSlot { slot, .. } if slot >= self.slots => ScanState::Done,
                ScanState::SeekSlot { slot, last, missed } => {
                    self.seek_slot(&span, &mut result, slot, last, missed).await
                }
                ScanState::Done => break,
            };
        }

        info!(
            "[{}] found {} files, {} gaps",
            day,
            result.anchors.len(),
            result.gaps.len()
        );
        result
    }

    async fn seek_slot(
        &self,
        span: &DaySpan,
        result: &mut DayResult,
        slot: u32,
        last: Anchor,
        missed: u32,
    ) -> ScanState {
        let day = span.day;
        let tz = self.locator.tz();
        let slots_ahead = missed + 1;

        let expected = match self.locator.expected_after(&last, slots_ahead) {
            Some(expected) if expected < span.end => expected,
            // a short (daylight saving) day runs out before its slots do
            _ => return ScanState::Done,
        };

        match self.locator.find_next(span, &last, slots_ahead).await {
            Some(anchor) => {
                info!(
                    "[{}] found file at {} - {}",
                    day,
                    anchor.timestamp,
                    readable_name(anchor.timestamp, tz)
                );
                result.anchors.push(anchor.clone());
                ScanState::SeekSlot {
                    slot: slot + 1,
                    last: anchor,
                    missed: 0,
                }
            }
            None => {
                if !self.locator.is_cancelled() {
                    warn!(
                        "[{}] could not find file for {}",
                        day,
                        readable_name(expected, tz)
                    );
                    result.gaps.push(expected);
                }
                ScanState::SeekSlot {
                    slot: slot + 1,
                    last,
                    missed: slots_ahead,
                }
            }
        }
    }
}
