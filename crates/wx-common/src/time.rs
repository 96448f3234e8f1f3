//! Time handling: injectable clock, sort order and half-open time ranges.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{WxError, WxResult};

/// Source of "now" for open-ended queries.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn at(ymd: (i32, u32, u32), hms: (u32, u32, u32)) -> WxResult<Self> {
        let dt = Utc
            .with_ymd_and_hms(ymd.0, ymd.1, ymd.2, hms.0, hms.1, hms.2)
            .single()
            .ok_or_else(|| WxError::invalid(format!("invalid clock instant {:?} {:?}", ymd, hms)))?;
        Ok(Self(dt))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Ordering of results for range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn is_descending(&self) -> bool {
        matches!(self, SortOrder::Desc)
    }
}

impl FromStr for SortOrder {
    type Err = WxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(WxError::invalid(format!(
                "sort order must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting `start >= end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> WxResult<Self> {
        if start >= end {
            return Err(WxError::invalid(format!(
                "time range start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// `[center - within, center + within)`.
    pub fn around(center: DateTime<Utc>, within: Duration) -> WxResult<Self> {
        Self::new(center - within, center + within)
    }

    pub fn contains(&self, time: &DateTime<Utc>) -> bool {
        *time >= self.start && *time < self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Calendar days (UTC) touched by the range, first to last inclusive.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let last = self.end.date_naive();
        let mut day = self.start.date_naive();
        while day <= last {
            days.push(day);
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        days
    }
}

/// Parse a user-supplied timestamp: RFC 3339, naive ISO (assumed UTC), or a
/// bare date.
pub fn parse_datetime(s: &str) -> WxResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(ndt) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(WxError::invalid(format!("unrecognized timestamp '{}'", s)))
}

/// Parse a duration such as `40m`, `2h`, `1d`, `90s` or plain minutes.
pub fn parse_duration(s: &str) -> WxResult<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => s.split_at(idx),
        None => (s, "m"),
    };
    let amount: i64 = digits
        .parse()
        .map_err(|_| WxError::invalid(format!("unrecognized duration '{}'", s)))?;
    match unit {
        "s" => Ok(Duration::seconds(amount)),
        "m" | "min" => Ok(Duration::minutes(amount)),
        "h" => Ok(Duration::hours(amount)),
        "d" => Ok(Duration::days(amount)),
        _ => Err(WxError::invalid(format!("unrecognized duration unit in '{}'", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 1, d, h, m, 0).unwrap()
    }

    #[test]
    fn test_range_is_half_open() {
        let range = TimeRange::new(ts(28, 5, 0), ts(28, 7, 0)).unwrap();
        assert!(range.contains(&ts(28, 5, 0)));
        assert!(range.contains(&ts(28, 6, 59)));
        assert!(!range.contains(&ts(28, 7, 0)));
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        assert!(TimeRange::new(ts(28, 7, 0), ts(28, 5, 0)).is_err());
        assert!(TimeRange::new(ts(28, 7, 0), ts(28, 7, 0)).is_err());
    }

    #[test]
    fn test_range_days_spans_midnight() {
        let range = TimeRange::new(ts(27, 23, 0), ts(28, 7, 15)).unwrap();
        let days = range.days();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2016, 1, 27).unwrap());
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2016, 1, 28).unwrap());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("DESC".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert_eq!(parse_datetime("2016-01-28T07:15:00Z").unwrap(), ts(28, 7, 15));
        assert_eq!(parse_datetime("2016-01-28T07:15").unwrap(), ts(28, 7, 15));
        assert_eq!(parse_datetime("2016-01-28").unwrap(), ts(28, 0, 0));
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("40m").unwrap(), Duration::minutes(40));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("15").unwrap(), Duration::minutes(15));
        assert!(parse_duration("2w").is_err());
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::at((2016, 1, 28), (7, 50, 0)).unwrap();
        assert_eq!(clock.now(), ts(28, 7, 50));
    }
}
