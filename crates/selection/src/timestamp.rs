//! Timestamps encoded in dataset names.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use wx_common::{WxError, WxResult};

static MINUTES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8}_\d{4}").expect("valid regex"));
static SECONDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8}_\d{6}").expect("valid regex"));

/// Naming scheme of a catalog's dataset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampPattern {
    /// `EAST-CONUS_4km_WV_20160128_0530.gini`
    GoesLegacy,
    /// `GOES16_20170618_003719_0.64_500m_33.3N_91.4W.nc4`
    Goes16,
    /// `Level2_KMUX_20170715_2333.ar2v`
    Nexrad2,
}

impl TimestampPattern {
    fn regex(&self) -> &'static Regex {
        match self {
            TimestampPattern::GoesLegacy | TimestampPattern::Nexrad2 => &MINUTES,
            TimestampPattern::Goes16 => &SECONDS,
        }
    }

    fn format(&self) -> &'static str {
        match self {
            TimestampPattern::GoesLegacy | TimestampPattern::Nexrad2 => "%Y%m%d_%H%M",
            TimestampPattern::Goes16 => "%Y%m%d_%H%M%S",
        }
    }

    /// Timestamp encoded in `name`.
    pub fn extract(&self, name: &str) -> WxResult<DateTime<Utc>> {
        let matched = self
            .regex()
            .find(name)
            .ok_or_else(|| WxError::invalid(format!("Invalid dataset name: {}", name)))?;
        let naive = NaiveDateTime::parse_from_str(matched.as_str(), self.format())
            .map_err(|e| WxError::invalid(format!("Invalid timestamp in dataset name {}: {}", name, e)))?;
        Ok(Utc.from_utc_datetime(&naive))
    }
}
