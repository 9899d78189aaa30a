//! Bounded pool of browser contexts.
//!
//! Caps the number of simultaneously live contexts. A permit is held for
//! the whole life of a [`ContextHandle`] and returned when it is dropped
//! or released.

use crate::renderer::{RenderContext, Renderer};
use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A live browser context borrowed from the pool.
pub struct ContextHandle {
    context: Box<dyn RenderContext>,
    _permit: OwnedSemaphorePermit,
    _active: ActiveGuard,
}

impl ContextHandle {
    pub fn context(&self) -> &dyn RenderContext {
        self.context.as_ref()
    }

    pub fn context_mut(&mut self) -> &mut dyn RenderContext {
        self.context.as_mut()
    }
}

/// Hands out browser contexts, at most `max_contexts` at a time.
pub struct SessionPool {
    renderer: Arc<dyn Renderer>,
    semaphore: Arc<Semaphore>,
    active_count: Arc<AtomicUsize>,
}

impl SessionPool {
    pub fn new(renderer: Arc<dyn Renderer>, max_contexts: usize) -> Self {
        Self {
            renderer,
            semaphore: Arc::new(Semaphore::new(max_contexts)),
            active_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Launch a context, waiting for a free slot first.
    pub async fn acquire(&self) -> Result<ContextHandle> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("semaphore closed: {}", e))?;

        let context = self.renderer.new_context().await?;
        self.active_count.fetch_add(1, Ordering::SeqCst);

        Ok(ContextHandle {
            context,
            _permit: permit,
            _active: ActiveGuard(Arc::clone(&self.active_count)),
        })
    }

    /// Close the context and free its slot.
    pub async fn release(&self, handle: ContextHandle) -> Result<()> {
        let ContextHandle {
            context,
            _permit,
            _active,
        } = handle;
        context.close().await
    }

    /// Number of currently live contexts.
    pub fn active(&self) -> usize {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}
