//! Run configuration: site profile, timeouts, browser and export options.
//!
//! Layering is defaults, then an optional JSON file, then `HOUND_*`
//! environment variables. CLI flags are applied last by the binary.

use crate::renderer::Selector;
use crate::sheet::writer::ExportFormat;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where and how to look things up on the results site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    /// Search landing page opened once per session.
    pub landing_url: String,
    /// Prefix for entity pages; the slug and a trailing `/` are appended.
    pub entity_base_url: String,
    /// Introductory overlay close button (XPath).
    pub overlay_close_xpath: String,
    /// Date link template in the history table; `{date}` is replaced by
    /// the `DD/MM/YY` label.
    pub date_link_xpath: String,
    /// Populated result rows after a date is activated (XPath).
    pub result_rows_xpath: String,
    /// Link carrying the competitor and dam names inside a result row.
    pub result_link_css: String,
    /// Competitor name inside the first result link.
    pub result_name_css: String,
    /// Placing text that marks a withdrawn runner.
    pub scratch_token: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            landing_url: "https://www.thegreyhoundrecorder.com.au/search/".into(),
            entity_base_url: "https://www.thegreyhoundrecorder.com.au/greyhounds/".into(),
            overlay_close_xpath:
                r#"//button[contains(@class, "CloseButton__ButtonElement-sc-79mh24-0")]"#.into(),
            date_link_xpath: r#"//tbody//a[text()="{date}"]"#.into(),
            result_rows_xpath:
                r#"//tbody[@data-v-284ac1bd]//tr[contains(@class, "results-event-selection")]"#
                    .into(),
            result_link_css: "a.results-event-selection__link".into(),
            result_name_css: "a.results-event-selection__link > span.results-event-selection__name"
                .into(),
            scratch_token: "SCR".into(),
        }
    }
}

impl SiteProfile {
    pub fn overlay_close(&self) -> Selector {
        Selector::xpath(&self.overlay_close_xpath)
    }

    pub fn date_link(&self, label: &str) -> Selector {
        Selector::xpath(self.date_link_xpath.replace("{date}", label))
    }

    pub fn result_rows(&self) -> Selector {
        Selector::xpath(&self.result_rows_xpath)
    }

    pub fn result_links(&self) -> Selector {
        Selector::css(&self.result_link_css)
    }

    pub fn result_name(&self) -> Selector {
        Selector::css(&self.result_name_css)
    }
}

/// Bounded waits, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub overlay_ms: u64,
    pub date_link_ms: u64,
    pub result_table_ms: u64,
    /// Fixed delay after each entity navigation for client-side rendering.
    pub settle_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            overlay_ms: 30_000,
            date_link_ms: 12_000,
            result_table_ms: 20_000,
            settle_ms: 2_000,
            poll_interval_ms: 100,
        }
    }
}

impl Timeouts {
    pub fn overlay(&self) -> Duration {
        Duration::from_millis(self.overlay_ms)
    }

    pub fn date_link(&self) -> Duration {
        Duration::from_millis(self.date_link_ms)
    }

    pub fn result_table(&self) -> Duration {
        Duration::from_millis(self.result_table_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chromium_path: Option<PathBuf>,
    pub no_sandbox: bool,
    pub extra_args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chromium_path: None,
            no_sandbox: false,
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// File name written next to the input file.
    pub output_name: String,
    /// Treat the first input row as a header instead of data.
    pub has_header: bool,
    /// Write the per-item diagnostics ledger beside the export.
    pub write_ledger: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            output_name: "Updated_AI_Parallel_Result.xlsx".into(),
            has_header: false,
            write_ledger: true,
        }
    }
}

/// Complete configuration for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub site: SiteProfile,
    pub timeouts: Timeouts,
    pub browser: BrowserOptions,
    pub export: ExportOptions,
}

impl ScrapeConfig {
    /// Per-user config file, `<config dir>/hound-harvest/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("hound-harvest").join("config.json"))
    }

    /// The explicit path if given, else the per-user file when it exists.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path().filter(|p| p.exists()),
        }
    }

    /// Load defaults, overlay a JSON file if given, then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("reading config {}", p.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", p.display()))?
            }
            None => ScrapeConfig::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `HOUND_*` environment overrides.
    pub fn apply_env(&mut self) {
        if let Ok(p) = std::env::var("HOUND_CHROMIUM_PATH") {
            if !p.trim().is_empty() {
                self.browser.chromium_path = Some(PathBuf::from(p));
            }
        }
        if let Some(v) = env_flag("HOUND_HEADLESS") {
            self.browser.headless = v;
        }
        if let Some(v) = env_flag("HOUND_NO_SANDBOX") {
            self.browser.no_sandbox = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.site.landing_url)
            .with_context(|| format!("invalid landing_url {:?}", self.site.landing_url))?;
        url::Url::parse(&self.site.entity_base_url)
            .with_context(|| format!("invalid entity_base_url {:?}", self.site.entity_base_url))?;
        if !self.site.date_link_xpath.contains("{date}") {
            bail!("date_link_xpath must contain a {{date}} placeholder");
        }
        if self.timeouts.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }
        let name = Path::new(&self.export.output_name);
        if self.export.output_name.is_empty()
            || name.file_name().map(|n| n != name.as_os_str()).unwrap_or(true)
        {
            bail!(
                "output_name must be a bare file name, got {:?}",
                self.export.output_name
            );
        }
        if ExportFormat::from_path(name).is_none() {
            bail!(
                "output_name must end in .xlsx or .csv, got {:?}",
                self.export.output_name
            );
        }
        Ok(())
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
