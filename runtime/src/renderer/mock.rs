//! In-memory renderer for exercising the extraction protocol without a
//! browser.
//!
//! Pages are keyed by URL (or by an arbitrary view key reached through a
//! click) and hold elements keyed by the exact selector string the
//! session will ask for.

use super::{PageElement, RenderContext, Renderer, Selector};
use crate::config::SiteProfile;
use crate::record::RawResultEntry;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A fake DOM element.
#[derive(Debug, Clone, Default)]
pub struct MockElement {
    text: String,
    children: HashMap<String, Vec<MockElement>>,
    on_click: Option<String>,
    broken: bool,
    click_failures: Arc<AtomicUsize>,
}

impl MockElement {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, selector: &Selector, children: Vec<MockElement>) -> Self {
        self.children.insert(selector.as_str().to_string(), children);
        self
    }

    /// Clicking switches the context to the page registered under `view`.
    pub fn on_click(mut self, view: impl Into<String>) -> Self {
        self.on_click = Some(view.into());
        self
    }

    /// The first `n` clicks fail, as if the element were still covered.
    pub fn fail_clicks(self, n: usize) -> Self {
        self.click_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Every operation on this element fails, like a stale CDP node.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// A result-table row laid out the way the live site renders it:
    /// placing in cell 0, trainer in cell 3, time/margin/split in 4..=6
    /// and starting price in cell 11.
    pub fn result_row(site: &SiteProfile, placing: &str, entry: &RawResultEntry) -> Self {
        let cells = [
            placing,
            "",
            "",
            entry.trainer.as_str(),
            entry.time.as_str(),
            entry.margin.as_str(),
            entry.split.as_str(),
            "",
            "",
            "",
            "",
            entry.starting_price.as_str(),
        ]
        .into_iter()
        .map(MockElement::text)
        .collect();

        let mut links = vec![MockElement::text(entry.name.as_str())];
        if !entry.dam.is_empty() {
            links.push(MockElement::text(entry.dam.as_str()));
        }

        MockElement::default()
            .with_children(&Selector::css("td"), cells)
            .with_children(&site.result_name(), vec![MockElement::text(entry.name.as_str())])
            .with_children(&site.result_links(), links)
    }
}

/// A fake page: selector string → matching elements.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    elements: HashMap<String, Vec<MockElement>>,
    latency: Duration,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &Selector, elements: Vec<MockElement>) -> Self {
        self.elements
            .insert(selector.as_str().to_string(), elements);
        self
    }

    /// Delay applied when this page is navigated to.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// The whole fake site.
#[derive(Debug, Default)]
pub struct MockSite {
    pages: HashMap<String, MockPage>,
    failing_urls: HashSet<String>,
}

impl MockSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, key: impl Into<String>, page: MockPage) -> Self {
        self.pages.insert(key.into(), page);
        self
    }

    /// Navigation to `url` returns an error.
    pub fn fail_navigation(mut self, url: impl Into<String>) -> Self {
        self.failing_urls.insert(url.into());
        self
    }
}

/// Renderer over a [`MockSite`], counting context lifecycle events.
pub struct MockRenderer {
    site: Arc<MockSite>,
    opened: AtomicUsize,
    closed: Arc<AtomicUsize>,
    launch_limit: Option<usize>,
    visited: Arc<Mutex<Vec<String>>>,
}

impl MockRenderer {
    pub fn new(site: MockSite) -> Self {
        Self {
            site: Arc::new(site),
            opened: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            launch_limit: None,
            visited: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Launches beyond the first `limit` fail.
    pub fn with_launch_limit(mut self, limit: usize) -> Self {
        self.launch_limit = Some(limit);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Every URL navigated to, across all contexts.
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Renderer for MockRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let n = self.opened.fetch_add(1, Ordering::SeqCst);
        if self.launch_limit.is_some_and(|limit| n >= limit) {
            self.opened.fetch_sub(1, Ordering::SeqCst);
            bail!("mock browser launch refused (limit reached)");
        }
        Ok(Box::new(MockContext {
            site: Arc::clone(&self.site),
            view: Arc::new(Mutex::new(None)),
            closed: Arc::clone(&self.closed),
            visited: Arc::clone(&self.visited),
        }))
    }
}

struct MockContext {
    site: Arc<MockSite>,
    view: Arc<Mutex<Option<String>>>,
    closed: Arc<AtomicUsize>,
    visited: Arc<Mutex<Vec<String>>>,
}

impl MockContext {
    fn lookup(&self, selector: &Selector) -> Vec<MockElement> {
        let view = self.view.lock().ok().and_then(|v| v.clone());
        view.and_then(|key| self.site.pages.get(&key))
            .and_then(|page| page.elements.get(selector.as_str()))
            .cloned()
            .unwrap_or_default()
    }

    fn wrap(&self, el: MockElement) -> Box<dyn PageElement> {
        Box::new(MockHandle {
            el,
            view: Arc::clone(&self.view),
        })
    }
}

#[async_trait]
impl RenderContext for MockContext {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        if let Ok(mut v) = self.visited.lock() {
            v.push(url.to_string());
        }
        if self.site.failing_urls.contains(url) {
            bail!("net::ERR_CONNECTION_RESET at {url}");
        }
        if let Some(page) = self.site.pages.get(url) {
            if !page.latency.is_zero() {
                tokio::time::sleep(page.latency).await;
            }
        }
        if let Ok(mut v) = self.view.lock() {
            *v = Some(url.to_string());
        }
        Ok(())
    }

    async fn find_one(
        &self,
        selector: &Selector,
        _timeout: Duration,
    ) -> Result<Option<Box<dyn PageElement>>> {
        Ok(self.lookup(selector).into_iter().next().map(|el| self.wrap(el)))
    }

    async fn find_all(
        &self,
        selector: &Selector,
        _timeout: Duration,
    ) -> Result<Vec<Box<dyn PageElement>>> {
        Ok(self
            .lookup(selector)
            .into_iter()
            .map(|el| self.wrap(el))
            .collect())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct MockHandle {
    el: MockElement,
    view: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl PageElement for MockHandle {
    async fn text(&self) -> Result<String> {
        if self.el.broken {
            bail!("stale element reference");
        }
        Ok(self.el.text.clone())
    }

    async fn click(&self) -> Result<()> {
        if self.el.broken {
            bail!("element is not clickable");
        }
        let pending = &self.el.click_failures;
        if pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            bail!("element is not clickable");
        }
        if let Some(target) = &self.el.on_click {
            if let Ok(mut v) = self.view.lock() {
                *v = Some(target.clone());
            }
        }
        Ok(())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn PageElement>>> {
        if self.el.broken {
            bail!("stale element reference");
        }
        Ok(self
            .el
            .children
            .get(selector.as_str())
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|el| {
                Box::new(MockHandle {
                    el,
                    view: Arc::clone(&self.view),
                }) as Box<dyn PageElement>
            })
            .collect())
    }
}
