//! End-to-end batch: load input, scrape, export.

use crate::audit::ledger::{ledger_path, write_ledger};
use crate::config::ScrapeConfig;
use crate::error::BatchError;
use crate::pool::coordinator::{BatchCoordinator, BatchReport, BatchStatus};
use crate::renderer::Renderer;
use crate::sheet::reader::load_items;
use crate::sheet::writer::{output_path, write_rows};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// What a successful run wrote.
#[derive(Debug)]
pub struct BatchOutput {
    pub output_path: PathBuf,
    pub rows_written: usize,
    pub ledger_path: Option<PathBuf>,
    pub report: BatchReport,
}

impl BatchOutput {
    pub fn status(&self) -> BatchStatus {
        self.report.status()
    }
}

/// Scrape every row of `input` and write the export beside it.
///
/// Fails without writing anything when the input is empty, the worker
/// count is zero, or nothing could be scraped.
pub async fn run_batch(
    input: &Path,
    worker_count: usize,
    config: Arc<ScrapeConfig>,
    renderer: Arc<dyn Renderer>,
    progress: Option<ProgressBar>,
) -> Result<BatchOutput, BatchError> {
    if worker_count == 0 {
        return Err(BatchError::InvalidWorkerCount(worker_count));
    }

    let items = load_items(input, config.export.has_header).map_err(BatchError::Input)?;
    if items.is_empty() {
        return Err(BatchError::EmptyInput);
    }

    let mut coordinator = BatchCoordinator::new(renderer, Arc::clone(&config));
    if let Some(bar) = progress {
        bar.set_length(items.len() as u64);
        coordinator = coordinator.with_progress(bar);
    }

    let report = coordinator.run(items, worker_count).await?;
    if report.status() == BatchStatus::NoData {
        return Err(BatchError::NothingScraped {
            lost_items: report.lost_items(),
        });
    }

    let output_path = output_path(input, &config.export.output_name);
    let rows_written = write_rows(&output_path, &report.rows).map_err(BatchError::Persist)?;
    info!("results saved to {}", output_path.display());

    let ledger_path = if config.export.write_ledger {
        let path = ledger_path(&output_path);
        match write_ledger(&path, &report) {
            Ok(_) => Some(path),
            Err(e) => {
                warn!("run ledger not written: {e:#}");
                None
            }
        }
    } else {
        None
    };

    Ok(BatchOutput {
        output_path,
        rows_written,
        ledger_path,
        report,
    })
}
