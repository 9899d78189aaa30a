//! Batch-level and sheet I/O errors.
//!
//! Per-item and per-row problems never surface here; they are folded into
//! empty export rows by the session.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("input file {0} does not exist")]
    Missing(PathBuf),

    #[error("unsupported input format {0:?} (expected xlsx, xlsm, xls, ods or csv)")]
    UnsupportedFormat(String),

    #[error("failed to read spreadsheet {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("spreadsheet {0} has no worksheets")]
    NoWorksheet(PathBuf),

    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write workbook {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    #[error("unsupported export format {0:?} (expected xlsx or csv)")]
    UnsupportedExport(String),

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("input has no data rows")]
    EmptyInput,

    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("no data scraped ({lost_items} items lost to failed workers); export skipped")]
    NothingScraped { lost_items: usize },

    #[error("failed to load input: {0}")]
    Input(#[source] SheetError),

    #[error("failed to save export: {0}")]
    Persist(#[source] SheetError),
}

impl BatchError {
    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            BatchError::NothingScraped { .. } => 2,
            _ => 1,
        }
    }
}
