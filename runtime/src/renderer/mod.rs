//! Browser capability seam.
//!
//! The extraction protocol only needs a handful of operations: open a URL,
//! locate one or many elements, read text, click, and close. `Renderer`
//! hands out independent `RenderContext`s, one per worker.

pub mod chromium;
#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// How to locate elements on a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(s: impl Into<String>) -> Self {
        Selector::Css(s.into())
    }

    pub fn xpath(s: impl Into<String>) -> Self {
        Selector::XPath(s.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selector::Css(s) | Selector::XPath(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(s) => write!(f, "css:{s}"),
            Selector::XPath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// Launches browser contexts.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Create a fresh, isolated browser context.
    async fn new_context(&self) -> Result<Box<dyn RenderContext>>;
}

/// One live browser handle.
///
/// `find_one` and `find_all` treat absence as a normal result: `Ok(None)`
/// and `Ok(vec![])` after the timeout. `Err` is reserved for transport or
/// protocol faults.
#[async_trait]
pub trait RenderContext: Send + Sync {
    /// Navigate to `url` and wait for the load event.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Wait up to `timeout` for an element matching `selector`.
    async fn find_one(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Option<Box<dyn PageElement>>>;

    /// Wait up to `timeout` for at least one element matching `selector`.
    async fn find_all(
        &self,
        selector: &Selector,
        timeout: Duration,
    ) -> Result<Vec<Box<dyn PageElement>>>;

    /// Release the underlying browser resources.
    async fn close(self: Box<Self>) -> Result<()>;
}

/// An element located on a page.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Rendered text content.
    async fn text(&self) -> Result<String>;

    async fn click(&self) -> Result<()>;

    /// Immediate descendant query (no waiting). Only CSS selectors are
    /// required to be supported.
    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn PageElement>>>;
}
