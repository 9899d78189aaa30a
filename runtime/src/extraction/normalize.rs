//! Shape scraped results into the fixed-width export row.

use crate::record::{DateCell, ExportRow, RawResultEntry};

/// Build the export row for one input item.
///
/// Keeps the first eight entries in order, right-pads with empty slots,
/// and upper-cases only the competitor name.
pub fn normalize(date: &DateCell, name: &str, results: &[RawResultEntry]) -> ExportRow {
    let slots = std::array::from_fn(|i| match results.get(i) {
        Some(entry) => RawResultEntry {
            name: entry.name.to_uppercase(),
            ..entry.clone()
        },
        None => RawResultEntry::default(),
    });

    ExportRow {
        date: export_date(date),
        name: name.to_string(),
        slots,
    }
}

/// Format a date cell as `YYYY-MM-DD`.
///
/// Text that does not parse falls back to its first whitespace-separated
/// token, so `"2024-03-07 junk"` still yields `2024-03-07`.
pub fn export_date(date: &DateCell) -> String {
    match date.to_date() {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => match date {
            DateCell::Text(s) => s.split_whitespace().next().unwrap_or("").to_string(),
            other => other.to_string(),
        },
    }
}

/// The `DD/MM/YY` label the history table uses for event dates.
pub fn history_label(date: &DateCell) -> Option<String> {
    date.to_date().map(|d| d.format("%d/%m/%y").to_string())
}
