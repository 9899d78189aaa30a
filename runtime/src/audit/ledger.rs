//! JSONL run ledger: one line per processed item and per lost worker.

use crate::live::outcome::ItemReport;
use crate::pool::coordinator::{BatchReport, WorkerSummary};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum LedgerEvent<'a> {
    Item {
        timestamp: &'a str,
        #[serde(flatten)]
        report: &'a ItemReport,
    },
    WorkerLost {
        timestamp: &'a str,
        #[serde(flatten)]
        worker: &'a WorkerSummary,
    },
}

/// Ledger path for an export file: `out.csv` → `out.audit.jsonl`.
pub fn ledger_path(export_path: &Path) -> PathBuf {
    export_path.with_extension("audit.jsonl")
}

/// Write the ledger for a finished batch, replacing any previous file.
pub fn write_ledger(path: &Path, report: &BatchReport) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("failed to create run ledger: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    let timestamp = Utc::now().to_rfc3339();

    let mut lines = 0;
    for item in &report.items {
        let json = serde_json::to_string(&LedgerEvent::Item {
            timestamp: &timestamp,
            report: item,
        })?;
        writeln!(out, "{json}")?;
        lines += 1;
    }
    for worker in report.workers.iter().filter(|w| w.is_lost()) {
        let json = serde_json::to_string(&LedgerEvent::WorkerLost {
            timestamp: &timestamp,
            worker,
        })?;
        writeln!(out, "{json}")?;
        lines += 1;
    }
    out.flush()?;
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::outcome::OutcomeStatus;

    #[test]
    fn test_ledger_path() {
        assert_eq!(
            ledger_path(Path::new("/x/Updated_AI_Parallel_Result.csv")),
            PathBuf::from("/x/Updated_AI_Parallel_Result.audit.jsonl")
        );
    }

    #[test]
    fn test_writes_items_and_lost_workers() {
        let report = BatchReport {
            total_items: 3,
            rows: Vec::new(),
            items: vec![ItemReport {
                worker: 1,
                row: 0,
                name: "Fast Eddie".into(),
                date: "2024-03-07".into(),
                status: OutcomeStatus::NoResults,
                results: 0,
                duration_ms: 12,
                detail: Some("date 07/03/24 not found".into()),
            }],
            workers: vec![
                WorkerSummary {
                    worker_id: 1,
                    assigned: 1,
                    returned: 1,
                    elapsed_ms: 40,
                    error: None,
                },
                WorkerSummary {
                    worker_id: 2,
                    assigned: 2,
                    returned: 0,
                    elapsed_ms: 0,
                    error: Some("launching chromium".into()),
                },
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.audit.jsonl");
        assert_eq!(write_ledger(&path, &report).unwrap(), 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0]["event"], "item");
        assert_eq!(lines[0]["status"], "no_results");
        assert_eq!(lines[0]["name"], "Fast Eddie");
        assert_eq!(lines[1]["event"], "worker_lost");
        assert_eq!(lines[1]["assigned"], 2);
    }
}
