//! Normalization of the Spanish expiration phrases found on detail pages,
//! e.g. `"Plazo: hasta las 14:00 horas del 5 de enero de 2030"`.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use thiserror::Error;

use crate::listing::{DATE_FORMAT, TIME_FORMAT};

/// Hour:minute, day, month name and year, in that order.
pub const DATE_PATTERN: &str = r".* (\d+:\d+).* (\d+) de (.*) de (\d+)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    #[error("no date phrase in {0:?}")]
    NoMatch(String),
    #[error("{joined:?} does not fit HH:MM_DD_Month_YYYY")]
    Layout { joined: String },
    #[error("unknown month name {0:?}")]
    UnknownMonth(String),
    #[error("{0:?} is not a valid date or time")]
    OutOfRange(String),
}

/// Month names to month numbers. Matching ignores case and surrounding
/// whitespace.
#[derive(Debug, Clone)]
pub struct MonthTable {
    names: Vec<(String, u32)>,
}

impl MonthTable {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        MonthTable {
            names: names
                .into_iter()
                .map(|(n, m)| (n.into().to_lowercase(), m))
                .collect(),
        }
    }

    pub fn spanish() -> Self {
        MonthTable::new([
            ("enero", 1),
            ("febrero", 2),
            ("marzo", 3),
            ("abril", 4),
            ("mayo", 5),
            ("junio", 6),
            ("julio", 7),
            ("agosto", 8),
            ("septiembre", 9),
            ("octubre", 10),
            ("noviembre", 11),
            ("diciembre", 12),
        ])
    }

    pub fn month(&self, name: &str) -> Option<u32> {
        let wanted = name.trim().to_lowercase();
        self.names
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, m)| *m)
    }
}

impl Default for MonthTable {
    fn default() -> Self {
        MonthTable::spanish()
    }
}

pub struct DateNormalizer {
    pattern: Regex,
    months: MonthTable,
}

impl DateNormalizer {
    pub fn new(months: MonthTable) -> Self {
        DateNormalizer {
            pattern: Regex::new(DATE_PATTERN).expect("date pattern is valid"),
            months,
        }
    }

    /// Extract the date phrase from `text` and parse it.
    pub fn parse(&self, text: &str) -> Result<(NaiveDate, NaiveTime), DateParseError> {
        let caps = self
            .pattern
            .captures(text)
            .ok_or_else(|| DateParseError::NoMatch(text.to_string()))?;

        let joined = (1..=4)
            .map(|i| caps.get(i).map_or("", |m| m.as_str()))
            .collect::<Vec<_>>()
            .join("_");

        self.parse_joined(&joined)
    }

    /// Parse a string shaped like `HH:MM_DD_MonthName_YYYY`.
    pub fn parse_joined(&self, joined: &str) -> Result<(NaiveDate, NaiveTime), DateParseError> {
        let layout = || DateParseError::Layout {
            joined: joined.to_string(),
        };

        let parts: Vec<&str> = joined.split('_').collect();
        let [clock, day, month, year] = parts.as_slice() else {
            return Err(layout());
        };
        let (hour, minute) = clock.split_once(':').ok_or_else(layout)?;

        let hour = number(hour, 1, 2).ok_or_else(layout)?;
        let minute = number(minute, 1, 2).ok_or_else(layout)?;
        let day = number(day, 1, 2).ok_or_else(layout)?;
        let year = number(year, 4, 4).ok_or_else(layout)?;
        let month = self
            .months
            .month(month)
            .ok_or_else(|| DateParseError::UnknownMonth(month.to_string()))?;

        let date = NaiveDate::from_ymd_opt(year as i32, month, day)
            .ok_or_else(|| DateParseError::OutOfRange(joined.to_string()))?;
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| DateParseError::OutOfRange(joined.to_string()))?;
        Ok((date, time))
    }

    /// Like [`parse`](Self::parse) but rendered as `("DD/MM/YYYY", "HH:MM")`.
    pub fn normalize(&self, text: &str) -> Result<(String, String), DateParseError> {
        let (date, time) = self.parse(text)?;
        Ok((
            date.format(DATE_FORMAT).to_string(),
            time.format(TIME_FORMAT).to_string(),
        ))
    }
}

impl Default for DateNormalizer {
    fn default() -> Self {
        DateNormalizer::new(MonthTable::spanish())
    }
}

fn number(s: &str, min_len: usize, max_len: usize) -> Option<u32> {
    if s.len() < min_len || s.len() > max_len || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
