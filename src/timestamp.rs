use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use filetime::FileTime;
use std::fmt;
use std::time::SystemTime;

/// chrono layout for the manifest timestamp field (yyyyMMddHHmmss)
pub const TIME_LAYOUT: &str = "%Y%m%d%H%M%S";

/// Number of digits in a manifest timestamp
pub const TIMESTAMP_DIGITS: usize = 14;

/// Civil local date-time with second precision, no timezone attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn new(datetime: NaiveDateTime) -> Self {
        Self(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    /// Convert a filesystem time to local civil time.
    /// Returns None when the year does not fit in four digits.
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        let local: DateTime<Local> = time.into();
        let naive = local.naive_local();
        if !(0..=9999).contains(&naive.year()) {
            return None;
        }
        Some(Self::new(naive))
    }

    /// Build a timestamp from 14 ASCII digits, checking calendar validity
    pub fn from_digits(digits: &str) -> Option<Self> {
        if digits.len() != TIMESTAMP_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let field = |range: std::ops::Range<usize>| digits[range].parse::<u32>().ok();

        let year = field(0..4)? as i32;
        let date = NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?;
        let datetime = date.and_hms_opt(field(8..10)?, field(10..12)?, field(12..14)?)?;
        Some(Self(datetime))
    }

    /// Resolve against the local timezone. A repeated wall-clock time picks
    /// the earlier instant; a skipped one has no resolution.
    pub fn to_local(&self) -> Option<DateTime<Local>> {
        Local.from_local_datetime(&self.0).earliest()
    }

    pub fn to_file_time(&self) -> Option<FileTime> {
        self.to_local()
            .map(|dt| FileTime::from_unix_time(dt.timestamp(), 0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_LAYOUT))
    }
}
