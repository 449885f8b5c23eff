//! Capabilities and options for the auto-fill driver

use crate::pagination::{CursorPagination, LoadStatus};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::watch;

/// Scroll geometry of the window or of a scroll container, in pixels
pub trait Viewport: Send + Sync {
    /// Distance scrolled from the top
    fn scroll_top(&self) -> f64;
    /// Visible height
    fn viewport_height(&self) -> f64;
    /// Total height of the scrollable content
    fn content_height(&self) -> f64;

    /// Distance left to scroll before reaching the bottom
    fn remaining(&self) -> f64 {
        self.content_height() - (self.scroll_top() + self.viewport_height())
    }

    /// Content fits without scrolling
    fn fits(&self) -> bool {
        self.content_height() <= self.viewport_height()
    }
}

/// Whatever the driver asks for more data
#[async_trait]
pub trait LoadSource: Send + Sync {
    /// Current flags
    fn status(&self) -> LoadStatus;

    /// Flag changes
    fn subscribe(&self) -> watch::Receiver<LoadStatus>;

    /// Request the next page
    async fn load_more(&self);
}

#[async_trait]
impl<T> LoadSource for CursorPagination<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    fn status(&self) -> LoadStatus {
        CursorPagination::status(self)
    }

    fn subscribe(&self) -> watch::Receiver<LoadStatus> {
        CursorPagination::subscribe(self)
    }

    async fn load_more(&self) {
        CursorPagination::load_more(self).await;
    }
}

/// How "near the bottom" is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerMode {
    /// Scroll events checked against the threshold
    #[default]
    Scroll,
    /// A sentinel element becoming visible
    Intersection,
}

/// Driver options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollOptions {
    /// Pixels from the bottom that count as near the bottom
    pub threshold: f64,
    /// Trigger mechanism
    pub mode: TriggerMode,
    /// Fill short viewports without waiting for the user to scroll
    pub auto_fill: bool,
    /// Fill at most once instead of until the viewport overflows
    pub auto_fill_once: bool,
    /// Wait after attaching before the first fill, to let layout settle
    pub settle_delay: Duration,
    /// Wait after a load finishes before re-checking the viewport
    pub refill_delay: Duration,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        Self {
            threshold: 200.0,
            mode: TriggerMode::Scroll,
            auto_fill: true,
            auto_fill_once: false,
            settle_delay: Duration::from_millis(150),
            refill_delay: Duration::from_millis(100),
        }
    }
}

impl ScrollOptions {
    /// Sentinel-based triggering; never auto-fills
    pub fn intersection() -> Self {
        Self {
            mode: TriggerMode::Intersection,
            ..Self::default()
        }
    }

    /// Set the near-bottom threshold
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Enable or disable auto-fill
    #[must_use]
    pub fn auto_fill(mut self, enabled: bool) -> Self {
        self.auto_fill = enabled;
        self
    }

    /// Fill only once after attaching
    #[must_use]
    pub fn auto_fill_once(mut self, once: bool) -> Self {
        self.auto_fill_once = once;
        self
    }

    /// Set the settle and refill delays
    #[must_use]
    pub fn delays(mut self, settle: Duration, refill: Duration) -> Self {
        self.settle_delay = settle;
        self.refill_delay = refill;
        self
    }
}

/// Listener state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attachment {
    /// Events are ignored
    Unattached,
    /// Events are handled and background fill tasks may run
    Attached,
}
