//! Date parsing and pattern formatting
//!
//! Patterns use a small token language (`yyyy`, `MMM`, `dd`, `HH`, `tt`, ...).
//! Tokens are matched in a single pass, longest first, so `MMMM` never leaves
//! a stray `M` behind for a shorter token to pick up.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const SHORT_MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const FULL_MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

const TINY_DAY_NAMES: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];
const SHORT_DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const FULL_DAY_NAMES: [&str; 7] = [
    "Sunday", "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday",
];

/// Alternation order matters: longer tokens sharing a prefix come first.
static TOKENS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("yyyy|yy|MMMM|MMM|MM|DDDD|dddd|DDD|ddd|DD|dd|HH|H|hh|mm|ss|tt")
        .expect("date token pattern is valid")
});

/// A point in time as seen by templates and the checkpoint.
///
/// `Invalid` stands for a date string that could not be parsed. It is
/// unordered: it compares neither less than nor greater than anything,
/// itself included.
#[derive(Debug, Clone, Copy)]
pub enum Timestamp {
    Valid(DateTime<Utc>),
    Invalid,
}

impl Timestamp {
    pub fn is_valid(&self) -> bool {
        matches!(self, Timestamp::Valid(_))
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Timestamp::Valid(dt) => Some(*dt),
            Timestamp::Invalid => None,
        }
    }

    /// ISO-8601 with millisecond precision and a `Z` suffix.
    pub fn to_iso_string(&self) -> Option<String> {
        self.as_datetime()
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Timestamp::Valid(a), Timestamp::Valid(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Timestamp::Valid(a), Timestamp::Valid(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Valid(dt)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_iso_string() {
            Some(iso) => write!(f, "{}", iso),
            None => write!(f, "Invalid Date"),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.to_iso_string() {
            Some(iso) => serializer.serialize_str(&iso),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(parse_str(&raw))
    }
}

/// Anything `parse` accepts.
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Absent,
    Text(&'a str),
    Structured(Timestamp),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(s: &'a str) -> Self {
        DateInput::Text(s)
    }
}

impl<'a> From<Option<&'a str>> for DateInput<'a> {
    fn from(s: Option<&'a str>) -> Self {
        s.map_or(DateInput::Absent, DateInput::Text)
    }
}

impl From<Timestamp> for DateInput<'_> {
    fn from(ts: Timestamp) -> Self {
        DateInput::Structured(ts)
    }
}

impl From<DateTime<Utc>> for DateInput<'_> {
    fn from(dt: DateTime<Utc>) -> Self {
        DateInput::Structured(Timestamp::Valid(dt))
    }
}

/// Parse a date input. `None` means "no timestamp known"; malformed text
/// yields `Some(Timestamp::Invalid)` instead of an error.
pub fn parse<'a>(input: impl Into<DateInput<'a>>) -> Option<Timestamp> {
    match input.into() {
        DateInput::Absent => None,
        DateInput::Text(s) if s.trim().is_empty() => None,
        DateInput::Text(s) => Some(parse_str(s)),
        DateInput::Structured(ts) => Some(ts),
    }
}

fn parse_str(input: &str) -> Timestamp {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Timestamp::Valid(dt.with_timezone(&Utc));
    }

    // Offset-less forms are taken as UTC
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Timestamp::Valid(naive.and_utc());
        }
    }

    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Timestamp::Valid(naive.and_utc());
    }

    Timestamp::Invalid
}

/// Format a timestamp against a token pattern. Without a pattern (or with an
/// empty one) the compact sortable form `yyyyMMddHHmmss` is returned.
pub fn format(ts: &Timestamp, pattern: Option<&str>) -> String {
    let Some(dt) = ts.as_datetime() else {
        return String::new();
    };

    match pattern.filter(|p| !p.is_empty()) {
        Some(pattern) => TOKENS
            .replace_all(pattern, |caps: &Captures| render_token(&caps[0], &dt))
            .into_owned(),
        None => dt.format("%Y%m%d%H%M%S").to_string(),
    }
}

fn render_token(token: &str, dt: &DateTime<Utc>) -> String {
    let month0 = dt.month0() as usize;
    let weekday = dt.weekday().num_days_from_sunday() as usize;
    let hour = dt.hour();

    match token {
        "yyyy" | "yy" => format!("{:04}", dt.year()),
        "MMMM" => FULL_MONTH_NAMES[month0].to_string(),
        "MMM" => SHORT_MONTH_NAMES[month0].to_string(),
        "MM" => format!("{:02}", month0 + 1),
        "DDDD" | "dddd" => FULL_DAY_NAMES[weekday].to_string(),
        "DDD" | "ddd" => SHORT_DAY_NAMES[weekday].to_string(),
        "DD" => TINY_DAY_NAMES[weekday].to_string(),
        "dd" => format!("{:02}", dt.day()),
        "HH" => format!("{:02}", hour),
        "H" => hour.to_string(),
        "hh" => format!("{:02}", if hour > 12 { hour - 12 } else { hour }),
        "mm" => format!("{:02}", dt.minute()),
        "ss" => format!("{:02}", dt.second()),
        "tt" => (if hour >= 12 { "PM" } else { "AM" }).to_string(),
        other => other.to_string(),
    }
}
