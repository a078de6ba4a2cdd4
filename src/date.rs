//! Date shape recognition and normalization.
//!
//! Catalogue date cells come in four shapes: `YYYY`, `YYYYMMDD`,
//! `YYYY-YYYY` and `YYYYMMDD-YYYYMMDD`. Ranges tolerate `-`, `–`, `—` or `/`
//! as separator with optional spaces, and the two ends may mix precisions.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static DATE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{4}|\d{8})\s*(?:[-–—/]\s*(\d{4}|\d{8})\s*)?$").expect("valid date regex")
});

/// Whether a normalized value denotes a full calendar day or only a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Day,
    Year,
}

impl Precision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Year => "year",
        }
    }

    /// XSD datatype local name for the normalized value.
    pub fn xsd_local(&self) -> &'static str {
        match self {
            Self::Day => "date",
            Self::Year => "gYear",
        }
    }
}

impl std::fmt::Display for Precision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed date value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    /// The digits as written (`1923` or `19230405`), used in node IRIs.
    pub raw: String,
    /// `YYYY` for years, ISO `YYYY-MM-DD` for days.
    pub normalized: String,
    pub precision: Precision,
}

/// A recognized date expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateExpr {
    Single(DateValue),
    Range { start: DateValue, end: DateValue },
}

/// Classify and normalize a date cell.
///
/// Returns `None` when the text matches none of the four shapes or an
/// 8-digit part is not a real calendar day.
pub fn parse_date_expr(text: &str) -> Option<DateExpr> {
    let caps = DATE_SHAPE.captures(text)?;
    let start = parse_single(caps.get(1)?.as_str())?;
    match caps.get(2) {
        None => Some(DateExpr::Single(start)),
        Some(end) => Some(DateExpr::Range {
            start,
            end: parse_single(end.as_str())?,
        }),
    }
}

/// Normalize one 4- or 8-digit component.
pub fn parse_single(digits: &str) -> Option<DateValue> {
    match digits.len() {
        4 if digits.bytes().all(|b| b.is_ascii_digit()) => Some(DateValue {
            raw: digits.to_string(),
            normalized: digits.to_string(),
            precision: Precision::Year,
        }),
        8 => {
            let date = NaiveDate::parse_from_str(digits, "%Y%m%d").ok()?;
            Some(DateValue {
                raw: digits.to_string(),
                normalized: date.format("%Y-%m-%d").to_string(),
                precision: Precision::Day,
            })
        }
        _ => None,
    }
}
