//! `hound-harvest run <input>`: scrape every row and export the results.

use crate::batch::{run_batch, BatchOutput};
use crate::cli::output::{self, Styled};
use crate::config::ScrapeConfig;
use crate::error::BatchError;
use crate::live::outcome::OutcomeStatus;
use crate::pool::coordinator::BatchStatus;
use crate::renderer::chromium::ChromiumRenderer;
use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Input spreadsheet (xlsx, xls, ods) or CSV: date in column 1, name in column 2.
    pub input: PathBuf,

    /// Number of parallel browsers.
    #[arg(short, long, default_value_t = 3)]
    pub workers: usize,

    /// JSON config file overriding defaults (default: per-user config.json if present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Treat the first input row as a header.
    #[arg(long)]
    pub header: bool,

    /// Export file name (written next to the input).
    #[arg(long)]
    pub output_name: Option<String>,

    /// Show browser windows.
    #[arg(long)]
    pub headed: bool,

    /// Launch Chromium with --no-sandbox (containers).
    #[arg(long)]
    pub no_sandbox: bool,

    /// Skip the per-item JSONL ledger.
    #[arg(long)]
    pub no_ledger: bool,
}

impl RunArgs {
    fn build_config(&self) -> Result<ScrapeConfig> {
        let path = ScrapeConfig::resolve_path(self.config.as_deref());
        let mut config = ScrapeConfig::load(path.as_deref())?;
        if self.header {
            config.export.has_header = true;
        }
        if let Some(name) = &self.output_name {
            config.export.output_name = name.clone();
        }
        if self.headed {
            config.browser.headless = false;
        }
        if self.no_sandbox {
            config.browser.no_sandbox = true;
        }
        if self.no_ledger {
            config.export.write_ledger = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Whether to draw a progress bar instead of streaming info logs.
pub fn wants_progress_bar() -> bool {
    !output::is_quiet()
        && !output::is_json()
        && !output::is_verbose()
        && std::io::stderr().is_terminal()
}

/// Run the batch. Returns the process exit code.
pub async fn run(args: RunArgs) -> Result<i32> {
    let s = Styled::new();
    let start = Instant::now();
    let config = Arc::new(args.build_config()?);

    let renderer = Arc::new(ChromiumRenderer::new(
        config.browser.clone(),
        config.timeouts.poll_interval(),
    ));

    let progress = wants_progress_bar().then(|| {
        let bar = ProgressBar::new(0);
        if let Ok(style) =
            ProgressStyle::with_template("  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} items  {elapsed}")
        {
            bar.set_style(style.progress_chars("\u{2588}\u{2589}\u{2591}"));
        }
        bar
    });

    let result = run_batch(
        &args.input,
        args.workers,
        Arc::clone(&config),
        renderer,
        progress.clone(),
    )
    .await;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    match result {
        Ok(out) => {
            print_summary(&s, &out, start.elapsed().as_millis() as u64);
            Ok(0)
        }
        Err(e) => {
            print_failure(&s, &e);
            Ok(e.exit_code())
        }
    }
}

fn print_summary(s: &Styled, out: &BatchOutput, elapsed_ms: u64) {
    let report = &out.report;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "status": out.status(),
            "output_path": out.output_path.display().to_string(),
            "ledger_path": out.ledger_path.as_ref().map(|p| p.display().to_string()),
            "rows_written": out.rows_written,
            "total_items": report.total_items,
            "scraped": report.count(OutcomeStatus::Scraped),
            "no_results": report.count(OutcomeStatus::NoResults),
            "failed": report.count(OutcomeStatus::Failed),
            "lost_items": report.lost_items(),
            "workers": report.workers,
            "duration_ms": elapsed_ms,
        }));
        return;
    }
    if output::is_quiet() {
        return;
    }

    let (sym, label) = match out.status() {
        BatchStatus::Complete => (s.ok_sym(), s.green("complete")),
        BatchStatus::Partial => (s.warn_sym(), s.yellow("partial")),
        BatchStatus::NoData => (s.fail_sym(), s.red("no data")),
    };
    eprintln!(
        "  {sym} Scraping {label} in {}",
        output::format_duration_ms(elapsed_ms)
    );
    eprintln!();
    output::print_check(s.ok_sym(), "Rows written", &out.rows_written.to_string());
    output::print_check(
        s.ok_sym(),
        "Scraped",
        &report.count(OutcomeStatus::Scraped).to_string(),
    );
    output::print_check(
        s.warn_sym(),
        "No results",
        &report.count(OutcomeStatus::NoResults).to_string(),
    );
    let failed = report.count(OutcomeStatus::Failed);
    if failed > 0 {
        output::print_check(s.fail_sym(), "Failed", &failed.to_string());
    }
    for worker in report.workers.iter().filter(|w| w.is_lost()) {
        output::print_check(
            s.fail_sym(),
            &format!("Worker {}", worker.worker_id),
            &format!("lost {} items", worker.assigned),
        );
        if let Some(err) = &worker.error {
            output::print_detail(&s.dim(err));
        }
    }
    eprintln!();
    eprintln!("  Results saved to {}", s.bold(&out.output_path.display().to_string()));
    if let Some(ledger) = &out.ledger_path {
        eprintln!("  Run ledger:      {}", s.dim(&ledger.display().to_string()));
    }
}

fn print_failure(s: &Styled, err: &BatchError) {
    if output::is_json() {
        let kind = match err {
            BatchError::EmptyInput => "empty_input",
            BatchError::InvalidWorkerCount(_) => "invalid_worker_count",
            BatchError::NothingScraped { .. } => "nothing_scraped",
            BatchError::Input(_) => "input",
            BatchError::Persist(_) => "persist",
        };
        output::print_json(&serde_json::json!({
            "error": kind,
            "message": err.to_string(),
        }));
        return;
    }
    let sym = match err {
        BatchError::NothingScraped { .. } | BatchError::EmptyInput => s.warn_sym(),
        _ => s.fail_sym(),
    };
    eprintln!("  {sym} {err}");
}
