//! Input items, scraped result entries and the fixed-width export row.
//!
//! The export schema is fixed at compile time: `Date`, `Name`, then eight
//! slots for each of the seven result fields, grouped by field.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Number of result slots carried by every export row.
pub const RESULT_SLOTS: usize = 8;

/// Column name prefixes, in export order.
const FIELD_PREFIXES: [&str; 7] = ["Dog", "Trainer", "Dam", "Time", "Mgn", "Split", "SP"];

/// Total number of export columns (2 + 8 × 7).
pub const COLUMN_COUNT: usize = 2 + RESULT_SLOTS * FIELD_PREFIXES.len();

/// The export column schema.
pub static COLUMNS: LazyLock<Vec<String>> = LazyLock::new(|| {
    let mut cols = Vec::with_capacity(COLUMN_COUNT);
    cols.push("Date".to_string());
    cols.push("Name".to_string());
    for prefix in FIELD_PREFIXES {
        for slot in 1..=RESULT_SLOTS {
            cols.push(format!("{prefix}{slot}"));
        }
    }
    cols
});

/// A date cell as read from the input sheet.
///
/// Spreadsheets hand back either typed dates or free text; both are kept
/// as-is until normalization so nothing is lost before formatting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DateCell {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl DateCell {
    /// Resolve to a calendar date, parsing text leniently.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            DateCell::Date(d) => Some(*d),
            DateCell::DateTime(dt) => Some(dt.date()),
            DateCell::Text(s) => parse_date_text(s),
        }
    }
}

impl fmt::Display for DateCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateCell::Date(d) => write!(f, "{d}"),
            DateCell::DateTime(dt) => write!(f, "{dt}"),
            DateCell::Text(s) => f.write_str(s),
        }
    }
}

/// Date-only formats tried in order. Month-first precedes day-first for
/// slash dates; an impossible month (e.g. `13/02/2024`) falls through.
/// Two-digit years go first since `%Y` would accept `03` as year 3.
const DATE_FORMATS: &[&str] = &[
    "%m/%d/%y", "%d/%m/%y", "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y",
    "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a free-text date using the known formats.
pub fn parse_date_text(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// One row of the input sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputItem {
    /// Zero-based row index in the source sheet.
    pub row: usize,
    pub date: DateCell,
    pub name: String,
}

impl InputItem {
    pub fn new(row: usize, date: DateCell, name: impl Into<String>) -> Self {
        Self {
            row,
            date,
            name: name.into(),
        }
    }
}

/// One scraped result-table row, pre-normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawResultEntry {
    pub name: String,
    pub trainer: String,
    pub dam: String,
    pub time: String,
    pub margin: String,
    pub split: String,
    pub starting_price: String,
}

/// The fixed-width normalized record for one input item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub date: String,
    pub name: String,
    /// Exactly [`RESULT_SLOTS`] entries; missing slots are empty.
    pub slots: [RawResultEntry; RESULT_SLOTS],
}

impl ExportRow {
    /// True when no slot carries any data.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| *s == RawResultEntry::default())
    }

    /// Number of populated slots.
    pub fn filled_slots(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| **s != RawResultEntry::default())
            .count()
    }

    /// Flatten into the export column order.
    pub fn to_record(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(COLUMN_COUNT);
        out.push(self.date.as_str());
        out.push(self.name.as_str());
        out.extend(self.slots.iter().map(|s| s.name.as_str()));
        out.extend(self.slots.iter().map(|s| s.trainer.as_str()));
        out.extend(self.slots.iter().map(|s| s.dam.as_str()));
        out.extend(self.slots.iter().map(|s| s.time.as_str()));
        out.extend(self.slots.iter().map(|s| s.margin.as_str()));
        out.extend(self.slots.iter().map(|s| s.split.as_str()));
        out.extend(self.slots.iter().map(|s| s.starting_price.as_str()));
        out
    }
}
