//! Per-item outcomes.
//!
//! Every input item ends in exactly one [`ItemOutcome`]; expected absences
//! are values, not errors, and failures carry the step they happened in.

use crate::extraction::normalize::normalize;
use crate::record::{ExportRow, InputItem, RawResultEntry};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// How far the per-item protocol got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStep {
    Started,
    Navigated,
    DateFound,
    DateMissing,
    ResultsScraped,
}

impl fmt::Display for ItemStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStep::Started => "started",
            ItemStep::Navigated => "navigated",
            ItemStep::DateFound => "date_found",
            ItemStep::DateMissing => "date_missing",
            ItemStep::ResultsScraped => "results_scraped",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Result table read; may still hold zero entries if every row was
    /// scratched or unreadable.
    Scraped(Vec<RawResultEntry>),
    /// The history table had no actionable link for this date.
    DateNotFound { label: String },
    /// Something unexpected went wrong at `step`.
    Failed { step: ItemStep, error: String },
}

impl ItemOutcome {
    pub fn results(&self) -> &[RawResultEntry] {
        match self {
            ItemOutcome::Scraped(entries) => entries,
            _ => &[],
        }
    }

    pub fn status(&self) -> OutcomeStatus {
        match self {
            ItemOutcome::Scraped(_) => OutcomeStatus::Scraped,
            ItemOutcome::DateNotFound { .. } => OutcomeStatus::NoResults,
            ItemOutcome::Failed { .. } => OutcomeStatus::Failed,
        }
    }

    /// Fold into the export row for `item`.
    pub fn to_row(&self, item: &InputItem) -> ExportRow {
        normalize(&item.date, &item.name, self.results())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Scraped,
    NoResults,
    Failed,
}

/// Diagnostics for one processed item.
#[derive(Debug, Clone, Serialize)]
pub struct ItemReport {
    pub worker: usize,
    pub row: usize,
    pub name: String,
    pub date: String,
    pub status: OutcomeStatus,
    pub results: usize,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ItemReport {
    pub fn new(worker: usize, item: &InputItem, outcome: &ItemOutcome, elapsed: Duration) -> Self {
        let detail = match outcome {
            ItemOutcome::Scraped(_) => None,
            ItemOutcome::DateNotFound { label } => Some(format!("date {label} not found")),
            ItemOutcome::Failed { step, error } => Some(format!("after {step}: {error}")),
        };
        Self {
            worker,
            row: item.row,
            name: item.name.clone(),
            date: item.date.to_string(),
            status: outcome.status(),
            results: outcome.results().len(),
            duration_ms: elapsed.as_millis() as u64,
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::DateCell;

    fn item() -> InputItem {
        InputItem::new(4, DateCell::Text("2024-01-05".into()), "Rapid Rex")
    }

    #[test]
    fn test_failed_outcome_yields_empty_row() {
        let outcome = ItemOutcome::Failed {
            step: ItemStep::Navigated,
            error: "boom".into(),
        };
        let row = outcome.to_row(&item());
        assert!(row.is_empty());
        assert_eq!(row.date, "2024-01-05");
        assert_eq!(row.name, "Rapid Rex");

        let report = ItemReport::new(2, &item(), &outcome, Duration::from_millis(15));
        assert_eq!(report.status, OutcomeStatus::Failed);
        assert_eq!(report.detail.as_deref(), Some("after navigated: boom"));
        assert_eq!(report.row, 4);
    }

    #[test]
    fn test_date_not_found_is_no_results() {
        let outcome = ItemOutcome::DateNotFound {
            label: "05/01/24".into(),
        };
        assert_eq!(outcome.status(), OutcomeStatus::NoResults);
        assert!(outcome.results().is_empty());
    }
}
