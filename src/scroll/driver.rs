//! Infinite-scroll driver
//!
//! Decides when a [`LoadSource`] should load its next page, based on scroll
//! events, sentinel visibility and viewport geometry.

use super::types::{Attachment, LoadSource, ScrollOptions, TriggerMode, Viewport};
use crate::pagination::LoadStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Drives a [`LoadSource`] from viewport events
///
/// [`attach`](Self::attach) spawns background tasks and must be called from
/// inside a tokio runtime. Dropping the driver detaches it.
pub struct InfiniteScroll<S: LoadSource + ?Sized + 'static> {
    inner: Arc<Inner<S>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

struct Inner<S: LoadSource + ?Sized> {
    source: Arc<S>,
    window: Arc<dyn Viewport>,
    container: Option<Arc<dyn Viewport>>,
    options: ScrollOptions,
    auto_loading: AtomicBool,
    initial_fill_done: AtomicBool,
    attached: AtomicBool,
}

/// Clears the auto-loading flag however the fill ends
struct FillGuard<'a>(&'a AtomicBool);

impl Drop for FillGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl<S: LoadSource + ?Sized + 'static> InfiniteScroll<S> {
    /// Create a driver measuring the window
    pub fn new(source: Arc<S>, window: Arc<dyn Viewport>, options: ScrollOptions) -> Self {
        Self::build(source, window, None, options)
    }

    /// Create a driver that fills a scroll container
    ///
    /// Auto-fill and scroll events then use the container's geometry instead
    /// of the window's.
    pub fn with_container(
        source: Arc<S>,
        window: Arc<dyn Viewport>,
        container: Arc<dyn Viewport>,
        options: ScrollOptions,
    ) -> Self {
        Self::build(source, window, Some(container), options)
    }

    fn build(
        source: Arc<S>,
        window: Arc<dyn Viewport>,
        container: Option<Arc<dyn Viewport>>,
        options: ScrollOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                window,
                container,
                options,
                auto_loading: AtomicBool::new(false),
                initial_fill_done: AtomicBool::new(false),
                attached: AtomicBool::new(false),
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Driver options
    pub fn options(&self) -> &ScrollOptions {
        &self.inner.options
    }

    /// Listener state
    pub fn attachment(&self) -> Attachment {
        if self.inner.attached.load(Ordering::SeqCst) {
            Attachment::Attached
        } else {
            Attachment::Unattached
        }
    }

    /// A fill pass is running
    pub fn is_filling(&self) -> bool {
        self.inner.auto_loading.load(Ordering::SeqCst)
    }

    /// The once-only fill has completed
    pub fn initial_fill_done(&self) -> bool {
        self.inner.initial_fill_done.load(Ordering::SeqCst)
    }

    /// Start handling events
    ///
    /// In scroll mode with auto-fill enabled this schedules a fill after the
    /// settle delay. Unless `auto_fill_once` is set, every finished load
    /// schedules another fill after the refill delay.
    pub fn attach(&self) {
        if self.inner.attached.swap(true, Ordering::SeqCst) {
            return;
        }
        let options = self.inner.options;
        debug!(mode = ?options.mode, auto_fill = options.auto_fill, "Attached infinite scroll");

        if options.mode != TriggerMode::Scroll || !options.auto_fill {
            return;
        }

        let mut tasks = self.lock_tasks();

        let inner = Arc::clone(&self.inner);
        tasks.push(tokio::spawn(async move {
            tokio::time::sleep(options.settle_delay).await;
            inner.fill_if_no_scroll(options.auto_fill_once).await;
        }));

        if !options.auto_fill_once {
            let inner = Arc::clone(&self.inner);
            tasks.push(tokio::spawn(async move { inner.watch_loads().await }));
        }
    }

    /// Stop handling events and cancel pending fills
    pub fn detach(&self) {
        if self.inner.attached.swap(false, Ordering::SeqCst) {
            debug!("Detached infinite scroll");
        }
        for task in self.lock_tasks().drain(..) {
            task.abort();
        }
    }

    /// Handle a scroll event
    ///
    /// Loads the next page when the bottom is within the threshold. Ignored
    /// in intersection mode and while detached.
    pub async fn on_scroll(&self) {
        let inner = &self.inner;
        if inner.options.mode != TriggerMode::Scroll || !inner.attached.load(Ordering::SeqCst) {
            return;
        }
        if !inner.source.status().can_load_more() {
            return;
        }
        let viewport = inner.scroll_viewport();
        if viewport.remaining() < inner.options.threshold || viewport.fits() {
            trace!(remaining = viewport.remaining(), "Near bottom");
            inner.source.load_more().await;
        }
    }

    /// Handle a sentinel visibility change
    ///
    /// Ignored in scroll mode and while detached.
    pub async fn on_intersection(&self, visible: bool) {
        let inner = &self.inner;
        if inner.options.mode != TriggerMode::Intersection
            || !inner.attached.load(Ordering::SeqCst)
        {
            return;
        }
        if visible && inner.source.status().can_load_more() {
            trace!("Sentinel visible");
            inner.source.load_more().await;
        }
    }

    /// Load pages while the content does not fill the viewport
    ///
    /// With `only_once` at most one page is loaded and later once-only
    /// calls do nothing. Overlapping calls return immediately.
    pub async fn fill_if_no_scroll(&self, only_once: bool) {
        self.inner.fill_if_no_scroll(only_once).await;
    }

    fn lock_tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: LoadSource + ?Sized + 'static> Drop for InfiniteScroll<S> {
    fn drop(&mut self) {
        self.detach();
    }
}

impl<S: LoadSource + ?Sized + 'static> std::fmt::Debug for InfiniteScroll<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfiniteScroll")
            .field("options", &self.inner.options)
            .field("attachment", &self.attachment())
            .field("filling", &self.is_filling())
            .field("has_container", &self.inner.container.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: LoadSource + ?Sized> Inner<S> {
    fn scroll_viewport(&self) -> &dyn Viewport {
        self.container.as_deref().unwrap_or(&*self.window)
    }

    fn needs_more(&self) -> bool {
        match &self.container {
            Some(container) => container.fits(),
            None => self.window.remaining() < self.options.threshold || self.window.fits(),
        }
    }

    async fn fill_if_no_scroll(&self, only_once: bool) {
        if only_once && self.initial_fill_done.load(Ordering::SeqCst) {
            return;
        }
        if self
            .auto_loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let _guard = FillGuard(&self.auto_loading);

        if only_once {
            tokio::task::yield_now().await;
            if !self.source.status().can_load_more() {
                return;
            }
            if self.needs_more() {
                debug!("Viewport not filled, loading one page");
                self.source.load_more().await;
            }
            self.initial_fill_done.store(true, Ordering::SeqCst);
            return;
        }

        loop {
            tokio::task::yield_now().await;
            if !self.source.status().can_load_more() || !self.needs_more() {
                break;
            }
            debug!("Viewport not filled, loading next page");
            self.source.load_more().await;
            if self.source.status().has_error {
                debug!("Fill stopped after failed load");
                break;
            }
        }
    }

    async fn watch_loads(&self) {
        let mut rx = self.source.subscribe();
        let mut prev: LoadStatus = *rx.borrow_and_update();

        while rx.changed().await.is_ok() {
            let current = *rx.borrow_and_update();
            // Busy states can be coalesced away, so any change that ends
            // idle counts as a finished load
            let finished = !current.is_busy() && (prev.is_busy() || prev != current);
            prev = current;

            if finished {
                tokio::time::sleep(self.options.refill_delay).await;
                self.fill_if_no_scroll(false).await;
                prev = *rx.borrow_and_update();
            }
        }
    }
}
