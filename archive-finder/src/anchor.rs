use chrono::{Days, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::FinderError;

/// A timestamp confirmed present on the remote side, and where it lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub timestamp: i64,
    pub url: String,
}

/// Builds `base_url/{timestamp}.{ext}` locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceAddress {
    base_url: String,
    extension: String,
}

impl ResourceAddress {
    pub fn new(base_url: &str, extension: &str) -> Self {
        ResourceAddress {
            base_url: base_url.trim_end_matches('/').to_string(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn url_for(&self, timestamp: i64) -> String {
        format!("{}/{}.{}", self.base_url, timestamp, self.extension)
    }

    pub fn anchor(&self, timestamp: i64) -> Anchor {
        Anchor {
            timestamp,
            url: self.url_for(timestamp),
        }
    }
}

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, FinderError> {
        if end < start {
            return Err(FinderError::InvalidDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// Today and tomorrow in the given zone, used when no usable range was supplied.
    pub fn default_for(tz: Tz) -> Self {
        let today = chrono::Utc::now().with_timezone(&tz).date_naive();
        let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
        DateRange {
            start: today,
            end: tomorrow,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|day| *day <= self.end)
            .collect()
    }
}

/// Epoch seconds of `hour:00:00` local time on `day` in `tz`.
///
/// When a DST change makes the local time ambiguous the earlier instant wins.
pub fn local_hour_start(day: NaiveDate, hour: u32, tz: Tz) -> Result<i64, FinderError> {
    let time = NaiveTime::from_hms_opt(hour, 0, 0)
        .ok_or_else(|| FinderError::AmbiguousLocalTime(format!("{} {}:00", day, hour)))?;
    let local = day.and_time(time);
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| FinderError::AmbiguousLocalTime(local.to_string()))
}

/// The `[start, end)` epoch span of the first local hour of `day`.
pub fn first_hour_bounds(day: NaiveDate, tz: Tz) -> Result<(i64, i64), FinderError> {
    let start = local_hour_start(day, 0, tz)?;
    let end = local_hour_start(day, 1, tz)?;
    Ok((start, end))
}

/// `"YYYY-MM-DD HH-mm-ss"` wall-clock name for a timestamp in `tz`.
pub fn readable_name(timestamp: i64, tz: Tz) -> String {
    match tz.timestamp_opt(timestamp, 0).single() {
        Some(dt) => dt.format("%Y-%m-%d %H-%M-%S").to_string(),
        None => timestamp.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Chicago;

    #[test]
    fn test_url_for_trims_separators() {
        let address = ResourceAddress::new("https://example.org/archive/files/", ".mp3");
        assert_eq!(
            address.url_for(1681189202),
            "https://example.org/archive/files/1681189202.mp3"
        );
        assert_eq!(address.anchor(5).timestamp, 5);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2023, 4, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 4, 12).unwrap();
        let range = DateRange::new(start, end).unwrap();
        assert_eq!(range.days().len(), 3);
        assert_eq!(range.days()[2], end);

        let single = DateRange::new(start, start).unwrap();
        assert_eq!(single.days(), vec![start]);
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        let start = NaiveDate::from_ymd_opt(2023, 4, 12).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 4, 10).unwrap();
        assert!(matches!(
            DateRange::new(start, end),
            Err(FinderError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn test_first_hour_in_central_daylight_time() {
        // 2023-04-11 00:00 CDT is 05:00 UTC
        let day = NaiveDate::from_ymd_opt(2023, 4, 11).unwrap();
        let (start, end) = first_hour_bounds(day, Chicago).unwrap();
        assert_eq!(start, 1681189200);
        assert_eq!(end - start, 3600);
    }

    #[test]
    fn test_first_hour_in_central_standard_time() {
        // 2023-01-15 00:00 CST is 06:00 UTC
        let day = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();
        let (start, _) = first_hour_bounds(day, Chicago).unwrap();
        assert_eq!(start, 1673762400);
    }

    #[test]
    fn test_readable_name() {
        assert_eq!(readable_name(1681189202, Chicago), "2023-04-11 00-00-02");
        assert_eq!(readable_name(0, chrono_tz::UTC), "1970-01-01 00-00-00");
    }
}
