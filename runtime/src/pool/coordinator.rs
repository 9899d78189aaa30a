//! Batch coordinator: partition, run workers concurrently, reassemble in
//! input order.

use crate::config::ScrapeConfig;
use crate::error::BatchError;
use crate::live::outcome::{ItemReport, OutcomeStatus};
use crate::pool::manager::SessionPool;
use crate::pool::partition::partition;
use crate::pool::worker::{run_worker, WorkerResult};
use crate::record::{ExportRow, InputItem};
use crate::renderer::Renderer;
use indicatif::ProgressBar;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Per-worker accounting.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    pub assigned: usize,
    pub returned: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerSummary {
    pub fn is_lost(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every item produced a row and nothing failed unexpectedly.
    Complete,
    /// Rows were produced, but some items failed or a worker was lost.
    Partial,
    /// Nothing to export.
    NoData,
}

/// Everything a batch produced, in input order.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub total_items: usize,
    pub rows: Vec<ExportRow>,
    pub items: Vec<ItemReport>,
    pub workers: Vec<WorkerSummary>,
}

impl BatchReport {
    pub fn status(&self) -> BatchStatus {
        if self.rows.is_empty() {
            BatchStatus::NoData
        } else if self.lost_items() > 0
            || self.items.iter().any(|r| r.status == OutcomeStatus::Failed)
        {
            BatchStatus::Partial
        } else {
            BatchStatus::Complete
        }
    }

    /// Items dropped because their worker never got going.
    pub fn lost_items(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| w.is_lost())
            .map(|w| w.assigned)
            .sum()
    }

    pub fn count(&self, status: OutcomeStatus) -> usize {
        self.items.iter().filter(|r| r.status == status).count()
    }
}

/// Runs a batch over a pool of `workers` browser sessions.
pub struct BatchCoordinator {
    renderer: Arc<dyn Renderer>,
    config: Arc<ScrapeConfig>,
    progress: Option<ProgressBar>,
}

impl BatchCoordinator {
    pub fn new(renderer: Arc<dyn Renderer>, config: Arc<ScrapeConfig>) -> Self {
        Self {
            renderer,
            config,
            progress: None,
        }
    }

    /// Advance `bar` once per processed item.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Scrape `items` with up to `worker_count` concurrent sessions.
    ///
    /// The worker count is clamped to the number of items. Output order
    /// equals input order regardless of which worker finishes first.
    pub async fn run(
        &self,
        items: Vec<InputItem>,
        worker_count: usize,
    ) -> Result<BatchReport, BatchError> {
        if items.is_empty() {
            return Err(BatchError::EmptyInput);
        }
        if worker_count == 0 {
            return Err(BatchError::InvalidWorkerCount(worker_count));
        }

        let total_items = items.len();
        let workers = worker_count.min(total_items);
        info!("{total_items} items across {workers} workers");

        let pool = Arc::new(SessionPool::new(Arc::clone(&self.renderer), workers));
        let slices = partition(items, workers);
        let sizes: Vec<usize> = slices.iter().map(Vec::len).collect();

        let handles: Vec<_> = slices
            .into_iter()
            .enumerate()
            .map(|(i, slice)| {
                let worker_id = i + 1;
                let fut = run_worker(
                    Arc::clone(&pool),
                    Arc::clone(&self.config),
                    worker_id,
                    slice,
                    self.progress.clone(),
                )
                .instrument(info_span!("worker", id = worker_id));
                tokio::spawn(fut)
            })
            .collect();

        // Joined in spawn order, which is worker-index order.
        let joined = futures::future::join_all(handles).await;

        let mut report = BatchReport {
            total_items,
            rows: Vec::with_capacity(total_items),
            items: Vec::with_capacity(total_items),
            workers: Vec::with_capacity(workers),
        };

        for (i, (result, assigned)) in joined.into_iter().zip(sizes).enumerate() {
            let worker_id = i + 1;
            let failure = match result {
                Ok(Ok(WorkerResult {
                    rows,
                    reports,
                    elapsed_ms,
                })) => {
                    info!("worker {worker_id} returned {} rows", rows.len());
                    report.workers.push(WorkerSummary {
                        worker_id,
                        assigned,
                        returned: rows.len(),
                        elapsed_ms,
                        error: None,
                    });
                    report.rows.extend(rows);
                    report.items.extend(reports);
                    continue;
                }
                Ok(Err(e)) => format!("{e:#}"),
                Err(join_err) => format!("worker task aborted: {join_err}"),
            };

            error!(
                worker = worker_id,
                lost = assigned,
                "worker {worker_id} failed, {assigned} items lost: {failure}"
            );
            report.workers.push(WorkerSummary {
                worker_id,
                assigned,
                returned: 0,
                elapsed_ms: 0,
                error: Some(failure),
            });
        }

        Ok(report)
    }
}
