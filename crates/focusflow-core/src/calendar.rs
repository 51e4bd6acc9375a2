use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, TimeDelta, Utc, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

/// The application calendar is pinned to JST. `Asia/Tokyo` carries a plain
/// +09:00 offset for every instant this code will ever see, so day
/// boundaries never depend on where the process runs.
pub const APP_TZ: Tz = chrono_tz::Asia::Tokyo;

const DAY_FORMAT: &str = "%Y-%m-%d";

fn day_pattern() -> &'static Regex {
    static DAY_RE: OnceLock<Regex> = OnceLock::new();
    DAY_RE.get_or_init(|| {
        Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("day pattern is a valid literal")
    })
}

/// One civil day in the fixed JST calendar. Canonical text form is strict
/// zero-padded `YYYY-MM-DD`; no time-of-day, no timezone metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDay(NaiveDate);

/// Outcome of parsing a raw day string. Invalid input is not an error:
/// callers substitute the current day via [`ParsedDay::resolve`] instead of
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDay {
    Valid(CalendarDay),
    FallbackToToday,
}

impl ParsedDay {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub fn day(&self) -> Option<CalendarDay> {
        match self {
            Self::Valid(day) => Some(*day),
            Self::FallbackToToday => None,
        }
    }

    /// The parsed day, or the day containing `now` when the input was
    /// unusable.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> CalendarDay {
        match self {
            Self::Valid(day) => *day,
            Self::FallbackToToday => CalendarDay::from_instant(now),
        }
    }
}

impl CalendarDay {
    /// The calendar day containing `instant`, in JST. An instant at or after
    /// 15:00 UTC already belongs to the next civil day.
    #[must_use]
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self(instant.with_timezone(&APP_TZ).date_naive())
    }

    #[must_use]
    pub fn today() -> Self {
        Self::from_instant(Utc::now())
    }

    /// Strict parse of canonical `YYYY-MM-DD`. Empty strings, stray text,
    /// and out-of-range components all come back as `FallbackToToday`.
    #[must_use]
    pub fn parse(raw: &str) -> ParsedDay {
        if !day_pattern().is_match(raw) {
            trace!(raw, "day string rejected by pattern");
            return ParsedDay::FallbackToToday;
        }
        match NaiveDate::parse_from_str(raw, DAY_FORMAT) {
            Ok(date) => ParsedDay::Valid(Self(date)),
            Err(err) => {
                trace!(raw, error = %err, "day string had out-of-range components");
                ParsedDay::FallbackToToday
            }
        }
    }

    /// Shift by `n` civil days (negative and zero allowed), rolling over
    /// month and year boundaries. Saturates at the calendar limits rather
    /// than panicking.
    #[must_use]
    pub fn add_days(self, n: i64) -> Self {
        self.0
            .checked_add_signed(TimeDelta::days(n))
            .map(Self)
            .unwrap_or(self)
    }

    /// The Monday on or before this day; a Sunday maps six days back.
    #[must_use]
    pub fn week_start(self) -> Self {
        let offset = self.0.weekday().num_days_from_monday() as i64;
        self.add_days(-offset)
    }

    /// Inclusive ascending run of days; empty when `end < start`. Owned, so
    /// it can be walked any number of times.
    #[must_use]
    pub fn range(start: Self, end: Self) -> Vec<Self> {
        let mut out = Vec::new();
        let mut cursor = start;
        while cursor <= end {
            out.push(cursor);
            cursor = cursor.add_days(1);
        }
        out
    }

    /// Signed whole-day distance from `other` to `self`.
    #[must_use]
    pub fn days_since(self, other: Self) -> i64 {
        self.0.signed_duration_since(other.0).num_days()
    }

    pub fn weekday(self) -> Weekday {
        self.0.weekday()
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day_of_month(self) -> u32 {
        self.0.day()
    }
}

/// Whether `raw` names the current JST calendar day. Syntactically invalid
/// input is simply not today; it never raises.
#[must_use]
pub fn is_today(raw: &str, now: DateTime<Utc>) -> bool {
    CalendarDay::parse(raw).day() == Some(CalendarDay::from_instant(now))
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl Serialize for CalendarDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CalendarDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        CalendarDay::parse(&raw)
            .day()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid calendar day: {raw}")))
    }
}
