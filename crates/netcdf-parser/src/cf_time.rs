//! CF-style time coordinates: `"<unit> since <reference>"`.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use wx_common::{WxError, WxResult};

/// Step size of a CF time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeStep {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeStep {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "msec" | "msecs" | "millisecond" | "milliseconds" | "ms" => Some(Self::Milliseconds),
            "sec" | "secs" | "second" | "seconds" | "s" => Some(Self::Seconds),
            "min" | "mins" | "minute" | "minutes" => Some(Self::Minutes),
            "hour" | "hours" | "hr" | "hrs" | "h" => Some(Self::Hours),
            "day" | "days" | "d" => Some(Self::Days),
            _ => None,
        }
    }

    fn millis(&self) -> f64 {
        match self {
            Self::Milliseconds => 1.0,
            Self::Seconds => 1_000.0,
            Self::Minutes => 60_000.0,
            Self::Hours => 3_600_000.0,
            Self::Days => 86_400_000.0,
        }
    }
}

/// A parsed `units` attribute of a time variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfTimeUnits {
    pub step: TimeStep,
    pub reference: DateTime<Utc>,
}

impl CfTimeUnits {
    /// Milliseconds since the Unix epoch; used when a variable carries no
    /// usable `units`.
    pub fn epoch_millis() -> Self {
        Self {
            step: TimeStep::Milliseconds,
            reference: DateTime::<Utc>::default(),
        }
    }

    pub fn parse(units: &str) -> WxResult<Self> {
        let (step, reference) = units
            .split_once(" since ")
            .ok_or_else(|| WxError::NetCdf(format!("Unrecognized time units '{}'", units)))?;
        let step = TimeStep::parse(step.trim())
            .ok_or_else(|| WxError::NetCdf(format!("Unrecognized time step in '{}'", units)))?;
        Ok(Self {
            step,
            reference: parse_reference(reference)?,
        })
    }

    /// Parse `units`, falling back to epoch milliseconds.
    pub fn parse_or_epoch(units: Option<&str>) -> Self {
        units
            .and_then(|u| Self::parse(u).ok())
            .unwrap_or_else(Self::epoch_millis)
    }

    pub fn to_datetime(&self, value: f64) -> WxResult<DateTime<Utc>> {
        if !value.is_finite() {
            return Err(WxError::NetCdf(format!("Non-finite time value {}", value)));
        }
        let millis = (value * self.step.millis()).round() as i64;
        self.reference
            .checked_add_signed(Duration::milliseconds(millis))
            .ok_or_else(|| WxError::NetCdf(format!("Time value {} out of range", value)))
    }
}

fn parse_reference(s: &str) -> WxResult<DateTime<Utc>> {
    let s = s.trim();
    let s = s.strip_suffix("UTC").map(str::trim).unwrap_or(s);

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let s = s.trim_end_matches('Z');
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| Utc.from_utc_datetime(&ndt))
        .ok_or_else(|| WxError::NetCdf(format!("Unrecognized reference time '{}'", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radar_msecs_units() {
        let units = CfTimeUnits::parse("msecs since 2017-07-15T00:00:00Z").unwrap();
        assert_eq!(units.step, TimeStep::Milliseconds);
        let t = units.to_datetime(84_600_500.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2017, 7, 15, 23, 30, 0).unwrap() + Duration::milliseconds(500));
    }

    #[test]
    fn test_utc_suffix_and_space_separator() {
        let units = CfTimeUnits::parse("seconds since 1970-01-01 00:00:00 UTC").unwrap();
        let t = units.to_datetime(1_453_967_400.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2016, 1, 28, 7, 50, 0).unwrap());
    }

    #[test]
    fn test_hours_and_days() {
        let hours = CfTimeUnits::parse("hours since 2016-01-01").unwrap();
        assert_eq!(hours.to_datetime(36.0).unwrap(), Utc.with_ymd_and_hms(2016, 1, 2, 12, 0, 0).unwrap());
        let days = CfTimeUnits::parse("days since 2016-01-01T00:00:00").unwrap();
        assert_eq!(days.to_datetime(0.5).unwrap(), Utc.with_ymd_and_hms(2016, 1, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_fallback_is_epoch_millis() {
        let units = CfTimeUnits::parse_or_epoch(Some("counts"));
        assert_eq!(units, CfTimeUnits::epoch_millis());
        let t = CfTimeUnits::parse_or_epoch(None).to_datetime(1_000.0).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 1).unwrap());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(CfTimeUnits::parse("fortnights since 2016-01-01").is_err());
        assert!(CfTimeUnits::parse("seconds after 2016-01-01").is_err());
        assert!(CfTimeUnits::epoch_millis().to_datetime(f64::NAN).is_err());
    }
}
