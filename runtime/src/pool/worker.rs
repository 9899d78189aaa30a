//! A worker drives one extraction session over its slice, strictly in
//! order.

use crate::config::ScrapeConfig;
use crate::live::outcome::ItemReport;
use crate::live::session::ExtractionSession;
use crate::pool::manager::SessionPool;
use crate::record::{ExportRow, InputItem};
use anyhow::Result;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Rows produced by one worker, in slice order.
#[derive(Debug, Clone)]
pub struct WorkerResult {
    pub rows: Vec<ExportRow>,
    pub reports: Vec<ItemReport>,
    pub elapsed_ms: u64,
}

/// Process `slice` on a fresh session. Returns one row per item; only
/// session start-up failures are returned as errors.
pub async fn run_worker(
    pool: Arc<SessionPool>,
    config: Arc<ScrapeConfig>,
    worker_id: usize,
    slice: Vec<InputItem>,
    progress: Option<ProgressBar>,
) -> Result<WorkerResult> {
    let started = Instant::now();
    info!("starting with {} rows", slice.len());

    let mut session = ExtractionSession::open(pool, config, worker_id).await?;

    let mut rows = Vec::with_capacity(slice.len());
    let mut reports = Vec::with_capacity(slice.len());
    for item in &slice {
        let (row, report) = session.process(item).await;
        rows.push(row);
        reports.push(report);
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Err(e) = session.close().await {
        warn!("closing browser: {e:#}");
    }
    info!("finished {} rows", rows.len());

    Ok(WorkerResult {
        rows,
        reports,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}
