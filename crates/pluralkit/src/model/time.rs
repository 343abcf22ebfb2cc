use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ValidationError;

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";
const BIRTHDAY_FORMAT: &str = "%Y-%m-%d";

/// A UTC instant with microsecond precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        microsecond: u32,
    ) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_micro_opt(hour, minute, second, microsecond))
            .map(|naive| Self(naive.and_utc()))
            .ok_or_else(|| {
                ValidationError::InvalidTimestamp(format!(
                    "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{microsecond:06}"
                ))
            })
    }

    /// Converts to UTC, dropping anything finer than a microsecond.
    pub fn from_datetime<Tz: TimeZone>(dt: DateTime<Tz>) -> Self {
        Self(dt.with_timezone(&Utc).trunc_subsecs(6))
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Parses RFC 3339; a missing offset is taken to be UTC.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let input = input.trim();
        DateTime::parse_from_rfc3339(input)
            .map(Self::from_datetime)
            .or_else(|_| {
                NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|naive| Self::from_datetime(naive.and_utc()))
            })
            .map_err(|_| ValidationError::InvalidTimestamp(input.to_string()))
    }

    pub fn to_wire(&self) -> String {
        self.0.format(WIRE_FORMAT).to_string()
    }

    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    pub fn microsecond(&self) -> u32 {
        self.0.nanosecond() / 1_000
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::from_datetime(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl PartialEq<DateTime<Utc>> for Timestamp {
    fn eq(&self, other: &DateTime<Utc>) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<DateTime<Utc>> for Timestamp {
    fn partial_cmp(&self, other: &DateTime<Utc>) -> Option<Ordering> {
        self.0.partial_cmp(other)
    }
}

impl PartialEq<Timestamp> for DateTime<Utc> {
    fn eq(&self, other: &Timestamp) -> bool {
        *self == other.0
    }
}

impl PartialOrd<Timestamp> for DateTime<Utc> {
    fn partial_cmp(&self, other: &Timestamp) -> Option<Ordering> {
        self.partial_cmp(&other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d %H:%M:%S UTC"))
    }
}

impl FromStr for Timestamp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A birthday, optionally without a year.
///
/// The API has no "no year" value: a hidden year is sent as year `0004` (a
/// leap year, so Feb 29 stays valid). Year `0001` is read as hidden too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Birthday {
    date: Timestamp,
    hidden_year: bool,
}

impl Birthday {
    pub const HIDDEN_YEAR: i32 = 4;

    pub fn new(year: i32, month: u32, day: u32) -> Result<Self, ValidationError> {
        if matches!(year, 1 | Self::HIDDEN_YEAR) {
            return Self::without_year(month, day);
        }
        Self::from_parts(year, month, day, false)
    }

    pub fn without_year(month: u32, day: u32) -> Result<Self, ValidationError> {
        Self::from_parts(Self::HIDDEN_YEAR, month, day, true)
    }

    fn from_parts(year: i32, month: u32, day: u32, hidden_year: bool) -> Result<Self, ValidationError> {
        Timestamp::new(year, month, day, 0, 0, 0, 0)
            .map(|date| Self { date, hidden_year })
            .map_err(|_| ValidationError::InvalidBirthday(format!("{year:04}-{month:02}-{day:02}")))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let date = NaiveDate::parse_from_str(input.trim(), BIRTHDAY_FORMAT)
            .map_err(|_| ValidationError::InvalidBirthday(input.to_string()))?;
        Self::new(date.year(), date.month(), date.day())
    }

    pub fn hidden_year(&self) -> bool {
        self.hidden_year
    }

    pub fn hide_year(self) -> Self {
        // every month/day pair exists in the leap year 0004
        Self::without_year(self.month(), self.day()).unwrap_or(self)
    }

    pub fn with_year(self, year: i32) -> Result<Self, ValidationError> {
        Self::new(year, self.month(), self.day())
    }

    /// `None` when the year is hidden.
    pub fn year(&self) -> Option<i32> {
        (!self.hidden_year).then(|| self.date.year())
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.date
    }

    pub fn to_wire(&self) -> String {
        self.date.0.format(BIRTHDAY_FORMAT).to_string()
    }
}

impl fmt::Display for Birthday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hidden_year {
            write!(f, "{}", self.date.0.format("%b %d"))
        } else {
            write!(f, "{}", self.date.0.format("%b %d, %Y"))
        }
    }
}

impl FromStr for Birthday {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Birthday {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Birthday {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
