//! Chromium renderer backed by `chromiumoxide` (CDP).
//!
//! Every context is its own browser process so workers never share
//! cookies, tabs or a CDP connection.

use super::{PageElement, RenderContext, Renderer, Selector};
use crate::config::BrowserOptions;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Find a Chromium binary: env override, then well-known names on `PATH`.
pub fn find_chromium() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("HOUND_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    for name in ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser"] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Launches one Chromium process per context.
pub struct ChromiumRenderer {
    options: BrowserOptions,
    poll_interval: Duration,
}

impl ChromiumRenderer {
    pub fn new(options: BrowserOptions, poll_interval: Duration) -> Self {
        Self {
            options,
            poll_interval,
        }
    }

    fn browser_config(&self) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder();

        let executable = self.options.chromium_path.clone().or_else(find_chromium);
        if let Some(path) = executable {
            builder = builder.chrome_executable(path);
        }
        if !self.options.headless {
            builder = builder.with_head();
        }
        if self.options.no_sandbox {
            builder = builder.no_sandbox();
        }
        builder = builder.arg("--disable-gpu");
        for arg in &self.options.extra_args {
            builder = builder.arg(arg.as_str());
        }

        builder.build().map_err(|e| anyhow::anyhow!("{e}"))
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let config = self.browser_config().context("building browser config")?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("launching chromium")?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e).context("opening browser tab");
            }
        };

        debug!("chromium context ready");
        Ok(Box::new(ChromiumContext {
            browser: Mutex::new(browser),
            page,
            handler_task,
            poll_interval: self.poll_interval,
        }))
    }
}

/// A single Chromium process with one tab.
pub struct ChromiumContext {
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    poll_interval: Duration,
}

/// Transport-level faults that mean the browser is gone, as opposed to an
/// element simply not being there yet.
fn is_transport_fault(err: &CdpError) -> bool {
    matches!(
        err,
        CdpError::Ws(_) | CdpError::NoResponse | CdpError::ChannelSendError(_)
    )
}

impl ChromiumContext {
    async fn query(&self, selector: &Selector) -> Result<Vec<Element>, CdpError> {
        match selector {
            Selector::Css(s) => self.page.find_elements(s.as_str()).await,
            Selector::XPath(s) => self.page.find_xpaths(s.as_str()).await,
        }
    }

    /// Poll until at least one match appears or the deadline passes.
    async fn poll(&self, selector: &Selector, timeout: Duration) -> Result<Vec<Element>> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.query(selector).await {
                Ok(found) if !found.is_empty() => return Ok(found),
                Ok(_) => {}
                Err(e) if is_transport_fault(&e) => {
                    return Err(e).with_context(|| format!("querying {selector}"));
                }
                Err(e) => debug!("query {selector} not ready: {e}"),
            }
            if Instant::now() >= deadline {
                return Ok(Vec::new());
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigating to {url}"))?;
        Ok(())
    }

    async fn find_one(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Option<Box<dyn PageElement>>> {
        let found = self.poll(selector, timeout).await?;
        Ok(found
            .into_iter()
            .next()
            .map(|el| Box::new(ChromiumElement(el)) as Box<dyn PageElement>))
    }

    async fn find_all(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Vec<Box<dyn PageElement>>> {
        let found = self.poll(selector, timeout).await?;
        Ok(found
            .into_iter()
            .map(|el| Box::new(ChromiumElement(el)) as Box<dyn PageElement>)
            .collect())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumContext {
            browser,
            page,
            handler_task,
            ..
        } = *self;
        drop(page);

        let mut browser = browser.into_inner();
        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            warn!("waiting for chromium to exit: {e}");
        }
        handler_task.abort();
        closed.context("closing chromium")?;
        Ok(())
    }
}

struct ChromiumElement(Element);

#[async_trait]
impl PageElement for ChromiumElement {
    async fn text(&self) -> Result<String> {
        let text = self.0.inner_text().await.context("reading element text")?;
        Ok(text.unwrap_or_default())
    }

    async fn click(&self) -> Result<()> {
        self.0.click().await.context("clicking element")?;
        Ok(())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn PageElement>>> {
        let found = match selector {
            Selector::Css(s) => self.0.find_elements(s.as_str()).await,
            Selector::XPath(s) => anyhow::bail!("xpath is not supported below an element: {s}"),
        }
        .with_context(|| format!("querying {selector} in element"))?;
        Ok(found
            .into_iter()
            .map(|el| Box::new(ChromiumElement(el)) as Box<dyn PageElement>)
            .collect())
    }
}
