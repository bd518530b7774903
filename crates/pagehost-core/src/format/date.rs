//! Timestamp rendering

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Literal the server stores before the database fills in a real time
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Naive layouts, read as local time
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-CN")]
    ZhCn,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhCn => "zh-CN",
        }
    }

    pub fn just_now(&self) -> &'static str {
        match self {
            Self::EnUs => "just now",
            Self::ZhCn => "刚刚",
        }
    }

    pub fn unknown_time(&self) -> &'static str {
        match self {
            Self::EnUs => "unknown time",
            Self::ZhCn => "未知时间",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            Self::EnUs => "%-m/%-d/%Y, %-I:%M:%S %p",
            Self::ZhCn => "%Y/%-m/%-d %H:%M:%S",
        }
    }

    /// Render a point in time in this locale's layout
    pub fn render<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> String
    where
        Tz::Offset: fmt::Display,
    {
        time.format(self.pattern()).to_string()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en-US" | "en" => Ok(Self::EnUs),
            "zh-CN" | "zh" => Ok(Self::ZhCn),
            other => Err(format!(
                "Invalid locale: {}. Valid options: en-US, zh-CN",
                other
            )),
        }
    }
}

/// Parse the timestamp shapes the server emits
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(time) = DateTime::parse_from_rfc3339(input) {
        return Some(time.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|time| time.with_timezone(&Utc));
        }
    }

    // Bare dates are midnight UTC
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Human-readable upload time in local time
pub fn format_date(input: &str, locale: Locale) -> String {
    if input == CURRENT_TIMESTAMP {
        return locale.just_now().to_string();
    }

    match parse_timestamp(input) {
        Some(time) => locale.render(&time.with_timezone(&Local)),
        None => locale.unknown_time().to_string(),
    }
}
