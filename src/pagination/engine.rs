//! Cursor pagination engine
//!
//! Owns an accumulating list of items, the forward cursor and the loading
//! flags for one list-consuming surface. Pages come from an injected
//! [`PageFetcher`].

use super::types::{normalize_page, Page};
use crate::api_error::error_message;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Source of raw pages
///
/// `cursor` is `None` for the first page. The returned value may be any of
/// the shapes [`normalize_page`] understands.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch one raw page
    async fn fetch(&self, cursor: Option<String>) -> Result<JsonValue>;
}

#[async_trait]
impl<F, Fut> PageFetcher for F
where
    F: Fn(Option<String>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<JsonValue>> + Send,
{
    async fn fetch(&self, cursor: Option<String>) -> Result<JsonValue> {
        (self)(cursor).await
    }
}

/// Engine options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Fetch the first page on [`CursorPagination::mount`]
    pub initial_load: bool,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self { initial_load: true }
    }
}

impl PaginationOptions {
    /// Options that skip the initial fetch
    pub fn manual() -> Self {
        Self {
            initial_load: false,
        }
    }
}

/// Everything the engine tracks
#[derive(Debug, Clone)]
pub struct PaginationState<T> {
    /// Items merged so far, in server order
    pub items: Vec<T>,
    /// Cursor for the next page
    pub cursor: Option<String>,
    /// First page of a fresh sequence is in flight
    pub loading: bool,
    /// A follow-up page is in flight
    pub loading_more: bool,
    /// Last failure
    pub error: Option<Arc<Error>>,
}

impl<T> Default for PaginationState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            loading: false,
            loading_more: false,
            error: None,
        }
    }
}

impl<T> PaginationState<T> {
    /// Check if another page can be requested
    pub fn has_next(&self) -> bool {
        self.cursor.is_some()
    }

    /// Check if any request is in flight
    pub fn is_busy(&self) -> bool {
        self.loading || self.loading_more
    }

    fn status(&self) -> LoadStatus {
        LoadStatus {
            has_next: self.has_next(),
            loading: self.loading,
            loading_more: self.loading_more,
            item_count: self.items.len(),
            has_error: self.error.is_some(),
        }
    }
}

/// Flags published on every state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStatus {
    /// A cursor for the next page exists
    pub has_next: bool,
    pub loading: bool,
    pub loading_more: bool,
    /// Items merged so far
    pub item_count: usize,
    pub has_error: bool,
}

impl LoadStatus {
    /// Check if any request is in flight
    pub fn is_busy(&self) -> bool {
        self.loading || self.loading_more
    }

    /// Another page may be requested right now
    pub fn can_load_more(&self) -> bool {
        self.has_next && !self.is_busy()
    }
}

/// Cursor-paged list over a [`PageFetcher`]
///
/// None of the operations return errors: failures land in
/// [`CursorPagination::error`].
///
/// Only [`CursorPagination::load_more`] guards against overlapping requests.
/// Calling [`CursorPagination::fetch_page`] again before the previous call
/// resolves merges results in resolution order.
pub struct CursorPagination<T = JsonValue> {
    fetcher: Arc<dyn PageFetcher>,
    options: PaginationOptions,
    state: Mutex<PaginationState<T>>,
    status: watch::Sender<LoadStatus>,
}

impl<T> CursorPagination<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Create an engine without fetching anything yet
    ///
    /// With `initial_load` the engine starts out `loading`, since a call to
    /// [`mount`](Self::mount) is expected to follow.
    pub fn new(fetcher: impl PageFetcher + 'static, options: PaginationOptions) -> Self {
        Self::with_fetcher(Arc::new(fetcher), options)
    }

    /// Create an engine around a shared fetcher
    pub fn with_fetcher(fetcher: Arc<dyn PageFetcher>, options: PaginationOptions) -> Self {
        let state = PaginationState {
            loading: options.initial_load,
            ..PaginationState::default()
        };
        let (status, _) = watch::channel(state.status());

        Self {
            fetcher,
            options,
            state: Mutex::new(state),
            status,
        }
    }

    /// Create an engine and run the initial load if enabled
    pub async fn load(fetcher: impl PageFetcher + 'static, options: PaginationOptions) -> Self {
        let engine = Self::new(fetcher, options);
        engine.mount().await;
        engine
    }

    /// Run the initial fetch if `initial_load` is set
    pub async fn mount(&self) {
        if self.options.initial_load {
            self.fetch_page(None, false).await;
        }
    }

    /// Fetch one page
    ///
    /// `append` extends the list; otherwise the list is replaced. On failure
    /// the error is stored, and a fresh load also empties the list.
    pub async fn fetch_page(&self, cursor: Option<String>, append: bool) {
        {
            let mut state = self.lock();
            if append {
                state.loading_more = true;
            } else {
                state.loading = true;
            }
            state.error = None;
            self.publish(&state);
        }

        self.complete_fetch(cursor, append).await;
    }

    /// Fetch the next page and append it
    ///
    /// Does nothing when there is no cursor or a request is in flight.
    pub async fn load_more(&self) {
        let cursor = {
            let mut state = self.lock();
            if state.is_busy() {
                debug!("load_more skipped: request in flight");
                return;
            }
            let Some(cursor) = state.cursor.clone() else {
                debug!("load_more skipped: no further pages");
                return;
            };
            state.loading_more = true;
            state.error = None;
            self.publish(&state);
            cursor
        };

        self.complete_fetch(Some(cursor), true).await;
    }

    /// Clear all state without touching the network
    pub fn reset(&self) {
        let mut state = self.lock();
        *state = PaginationState::default();
        self.publish(&state);
    }

    /// Start the sequence over from the first page
    pub async fn refresh(&self) {
        self.reset();
        self.fetch_page(None, false).await;
    }

    /// Items merged so far
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Number of items merged so far
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Check if no items are loaded
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Current cursor
    pub fn cursor(&self) -> Option<String> {
        self.lock().cursor.clone()
    }

    /// Check if another page can be requested
    pub fn has_next(&self) -> bool {
        self.lock().has_next()
    }

    /// First page in flight
    pub fn loading(&self) -> bool {
        self.lock().loading
    }

    /// Follow-up page in flight
    pub fn loading_more(&self) -> bool {
        self.lock().loading_more
    }

    /// Last failure
    pub fn error(&self) -> Option<Arc<Error>> {
        self.lock().error.clone()
    }

    /// User-facing message for the last failure
    pub fn error_message(&self) -> Option<String> {
        self.lock().error.as_deref().map(error_message)
    }

    /// Copy of the full state
    pub fn snapshot(&self) -> PaginationState<T> {
        self.lock().clone()
    }

    /// Current flags
    pub fn status(&self) -> LoadStatus {
        *self.status.borrow()
    }

    /// Watch flag changes
    pub fn subscribe(&self) -> watch::Receiver<LoadStatus> {
        self.status.subscribe()
    }

    async fn complete_fetch(&self, cursor: Option<String>, append: bool) {
        let result = self
            .fetcher
            .fetch(cursor)
            .await
            .and_then(|raw| normalize_page(&raw).decode::<T>());

        let mut state = self.lock();
        match result {
            Ok(Page { results, next }) => {
                debug!(
                    count = results.len(),
                    has_next = next.is_some(),
                    append,
                    "Merged page"
                );
                state.cursor = next;
                if append {
                    state.items.extend(results);
                } else {
                    state.items = results;
                }
            }
            Err(e) => {
                warn!(append, "Page fetch failed: {e}");
                state.error = Some(Arc::new(e));
                if !append {
                    state.items.clear();
                }
            }
        }
        state.loading = false;
        state.loading_more = false;
        self.publish(&state);
    }

    fn lock(&self) -> MutexGuard<'_, PaginationState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &PaginationState<T>) {
        // Never fails, with or without receivers
        self.status.send_replace(state.status());
    }
}

impl<T> std::fmt::Debug for CursorPagination<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorPagination")
            .field("options", &self.options)
            .field("status", &*self.status.borrow())
            .finish_non_exhaustive()
    }
}
