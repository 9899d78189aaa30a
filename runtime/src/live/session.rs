//! Extraction session: one browser context driving the per-entity
//! navigation protocol.
//!
//! `Init → Landed → (per item)`, ending when `close` consumes the session
//! and releases its context. Landing opens the search page and
//! dismisses the intro overlay if it shows up. Each item then navigates to
//! the entity page, looks for the event date in the history table, opens
//! it and reads the result table. Whatever happens, each item produces
//! exactly one export row.

use crate::config::{ScrapeConfig, Timeouts};
use crate::extraction::normalize::history_label;
use crate::extraction::result_table::scrape_rows;
use crate::extraction::slug::entity_url;
use crate::live::outcome::{ItemOutcome, ItemReport, ItemStep};
use crate::pool::manager::{ContextHandle, SessionPool};
use crate::record::{ExportRow, InputItem};
use crate::renderer::{RenderContext, Selector};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Landed,
}

pub struct ExtractionSession {
    worker_id: usize,
    handle: ContextHandle,
    pool: Arc<SessionPool>,
    config: Arc<ScrapeConfig>,
    state: SessionState,
}

impl ExtractionSession {
    /// Acquire a context and land on the search page.
    ///
    /// If landing fails the context is released before the error is
    /// returned.
    pub async fn open(
        pool: Arc<SessionPool>,
        config: Arc<ScrapeConfig>,
        worker_id: usize,
    ) -> Result<Self> {
        let handle = pool.acquire().await.context("acquiring browser context")?;
        let mut session = Self {
            worker_id,
            handle,
            pool,
            config,
            state: SessionState::Init,
        };

        if let Err(e) = session.land().await {
            if let Err(close_err) = session.close().await {
                warn!("closing browser after failed landing: {close_err:#}");
            }
            return Err(e);
        }
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    async fn land(&mut self) -> Result<()> {
        let site = &self.config.site;
        let timeouts = &self.config.timeouts;

        self.handle
            .context_mut()
            .navigate(&site.landing_url)
            .await
            .context("opening landing page")?;

        match self
            .handle
            .context()
            .find_one(&site.overlay_close(), timeouts.overlay())
            .await
        {
            Ok(Some(button)) => match button.click().await {
                Ok(()) => info!("intro overlay closed"),
                Err(e) => debug!("intro overlay close failed: {e:#}"),
            },
            Ok(None) => info!("no intro overlay displayed"),
            Err(e) => debug!("overlay lookup failed: {e:#}"),
        }

        self.state = SessionState::Landed;
        Ok(())
    }

    /// Process one item. Never fails: unexpected errors become an
    /// empty-results row.
    pub async fn process(&mut self, item: &InputItem) -> (ExportRow, ItemReport) {
        let started = Instant::now();
        let mut step = ItemStep::Started;

        let outcome = match self.scrape_item(item, &mut step).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(row = item.row, name = %item.name, "item failed after {step}: {e:#}");
                ItemOutcome::Failed {
                    step,
                    error: format!("{e:#}"),
                }
            }
        };

        match &outcome {
            ItemOutcome::Scraped(entries) => {
                info!(row = item.row, "scraped {} results for {}", entries.len(), item.name)
            }
            ItemOutcome::DateNotFound { label } => info!(
                row = item.row,
                "date {label} not found or not clickable for {}; skipping", item.name
            ),
            ItemOutcome::Failed { .. } => {}
        }

        let row = outcome.to_row(item);
        let report = ItemReport::new(self.worker_id, item, &outcome, started.elapsed());
        (row, report)
    }

    async fn scrape_item(&mut self, item: &InputItem, step: &mut ItemStep) -> Result<ItemOutcome> {
        if self.state != SessionState::Landed {
            bail!("session is {:?}, expected Landed", self.state);
        }
        let site = &self.config.site;
        let timeouts = &self.config.timeouts;

        if item.name.trim().is_empty() {
            bail!("row has no entity name");
        }
        let label = history_label(&item.date)
            .with_context(|| format!("unparseable date {:?}", item.date.to_string()))?;
        let url = entity_url(&site.entity_base_url, &item.name);
        info!(row = item.row, "processing {} - {label}", item.name);
        debug!("navigating to {url}");

        self.handle.context_mut().navigate(&url).await?;
        *step = ItemStep::Navigated;
        if !timeouts.settle().is_zero() {
            tokio::time::sleep(timeouts.settle()).await;
        }

        let ctx = self.handle.context();
        if !activate_date_link(ctx, site.date_link(&label), timeouts).await? {
            *step = ItemStep::DateMissing;
            return Ok(ItemOutcome::DateNotFound { label });
        }
        *step = ItemStep::DateFound;
        debug!("clicked date link {label}");

        let rows = ctx
            .find_all(&site.result_rows(), timeouts.result_table())
            .await
            .context("waiting for result table")?;
        if rows.is_empty() {
            bail!(
                "result table did not populate within {}ms",
                timeouts.result_table_ms
            );
        }

        let entries = scrape_rows(site, &rows).await;
        *step = ItemStep::ResultsScraped;
        Ok(ItemOutcome::Scraped(entries))
    }

    /// Release the browser context. Consumes the session.
    pub async fn close(self) -> Result<()> {
        let Self {
            worker_id,
            handle,
            pool,
            ..
        } = self;
        pool.release(handle).await?;
        debug!(worker = worker_id, "browser closed");
        Ok(())
    }
}

/// Wait for the date link to appear and accept a click, re-locating it
/// between attempts. `Ok(false)` once the date-link deadline passes.
async fn activate_date_link(
    ctx: &dyn RenderContext,
    selector: Selector,
    timeouts: &Timeouts,
) -> Result<bool> {
    let deadline = Instant::now() + timeouts.date_link();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Some(link) = ctx
            .find_one(&selector, remaining)
            .await
            .context("looking up date link")?
        else {
            return Ok(false);
        };
        match link.click().await {
            Ok(()) => return Ok(true),
            Err(e) if Instant::now() >= deadline => {
                debug!("date link still not clickable: {e:#}");
                return Ok(false);
            }
            Err(e) => debug!("date link not clickable yet: {e:#}"),
        }
        tokio::time::sleep(timeouts.poll_interval()).await;
    }
}
