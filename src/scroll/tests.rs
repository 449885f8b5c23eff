use super::*;
use crate::error::{Error, Result};
use crate::pagination::{CursorPagination, PageFetcher, PaginationOptions};
use crate::types::JsonValue;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use test_case::test_case;

// ============================================================================
// Fixtures
// ============================================================================

/// Serves `pages` pages of `per_page` consecutive numbers
struct Pages {
    pages: usize,
    per_page: usize,
    fail_at: Option<usize>,
    calls: AtomicUsize,
}

impl Pages {
    fn new(pages: usize, per_page: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            per_page,
            fail_at: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing_at(pages: usize, per_page: usize, fail_at: usize) -> Arc<Self> {
        Arc::new(Self {
            pages,
            per_page,
            fail_at: Some(fail_at),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for Pages {
    async fn fetch(&self, cursor: Option<String>) -> Result<JsonValue> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let page = cursor
            .as_deref()
            .and_then(|c| c.strip_prefix('p'))
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        if self.fail_at == Some(page) {
            return Err(Error::Other("backend down".into()));
        }
        let start = page * self.per_page;
        let results: Vec<usize> = (start..start + self.per_page).collect();
        let next = (page + 1 < self.pages).then(|| format!("/api/items/?cursor=p{}", page + 1));
        Ok(json!({ "results": results, "next": next }))
    }
}

/// Rows of fixed height stacked inside a fixed-height viewport
struct ListViewport {
    engine: Arc<CursorPagination>,
    row_height: f64,
    height: f64,
    top: Mutex<f64>,
}

impl ListViewport {
    fn new(engine: &Arc<CursorPagination>, row_height: f64, height: f64) -> Arc<Self> {
        Arc::new(Self {
            engine: Arc::clone(engine),
            row_height,
            height,
            top: Mutex::new(0.0),
        })
    }

    fn scroll_to(&self, top: f64) {
        *self.top.lock().unwrap() = top;
    }
}

impl Viewport for ListViewport {
    fn scroll_top(&self) -> f64 {
        *self.top.lock().unwrap()
    }

    fn viewport_height(&self) -> f64 {
        self.height
    }

    fn content_height(&self) -> f64 {
        self.engine.len() as f64 * self.row_height
    }
}

/// Geometry that never changes
struct FixedViewport {
    top: f64,
    height: f64,
    content: f64,
}

impl Viewport for FixedViewport {
    fn scroll_top(&self) -> f64 {
        self.top
    }

    fn viewport_height(&self) -> f64 {
        self.height
    }

    fn content_height(&self) -> f64 {
        self.content
    }
}

/// A long page scrolled to the top
fn tall_window() -> Arc<dyn Viewport> {
    Arc::new(FixedViewport {
        top: 0.0,
        height: 500.0,
        content: 5000.0,
    })
}

async fn mounted(pages: &Arc<Pages>) -> Arc<CursorPagination> {
    let engine = Arc::new(CursorPagination::with_fetcher(
        pages.clone(),
        PaginationOptions::default(),
    ));
    engine.mount().await;
    engine
}

fn fast() -> ScrollOptions {
    ScrollOptions::default().delays(Duration::from_millis(1), Duration::from_millis(1))
}

async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..400 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_default_options() {
    let options = ScrollOptions::default();
    assert_eq!(options.threshold, 200.0);
    assert_eq!(options.mode, TriggerMode::Scroll);
    assert!(options.auto_fill);
    assert!(!options.auto_fill_once);
    assert_eq!(options.settle_delay, Duration::from_millis(150));
    assert_eq!(options.refill_delay, Duration::from_millis(100));
}

#[test]
fn test_intersection_options() {
    let options = ScrollOptions::intersection().threshold(50.0).auto_fill_once(true);
    assert_eq!(options.mode, TriggerMode::Intersection);
    assert_eq!(options.threshold, 50.0);
    assert!(options.auto_fill_once);
}

#[test]
fn test_viewport_helpers() {
    let viewport = FixedViewport {
        top: 100.0,
        height: 400.0,
        content: 800.0,
    };
    assert_eq!(viewport.remaining(), 300.0);
    assert!(!viewport.fits());

    let short = FixedViewport {
        top: 0.0,
        height: 400.0,
        content: 400.0,
    };
    assert!(short.fits());
}

// ============================================================================
// Auto-fill
// ============================================================================

#[test_case(0.0, 6 ; "stops once content overflows")]
#[test_case(200.0, 8 ; "keeps going inside the threshold")]
#[tokio::test]
async fn test_fill_loads_until_viewport_filled(threshold: f64, expected: usize) {
    let pages = Pages::new(10, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast().threshold(threshold));

    driver.fill_if_no_scroll(false).await;

    assert_eq!(engine.len(), expected);
    assert!(engine.has_next());
    assert!(!driver.is_filling());
}

#[tokio::test]
async fn test_fill_stops_when_pages_run_out() {
    let pages = Pages::new(3, 1);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 10.0, 1000.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast());

    driver.fill_if_no_scroll(false).await;

    assert_eq!(engine.len(), 3);
    assert!(!engine.has_next());
    assert_eq!(pages.calls(), 3);
}

#[tokio::test]
async fn test_fill_stops_after_failed_load() {
    let pages = Pages::failing_at(10, 1, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 10.0, 1000.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast());

    driver.fill_if_no_scroll(false).await;

    assert_eq!(engine.len(), 2);
    assert_eq!(pages.calls(), 3);
    assert!(engine.error().is_some());
    // cursor survives, so a later trigger can retry
    assert!(engine.has_next());
}

#[tokio::test]
async fn test_fill_once_loads_a_single_page() {
    let pages = Pages::new(10, 1);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 10.0, 1000.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast());

    driver.fill_if_no_scroll(true).await;
    assert_eq!(engine.len(), 2);
    assert!(driver.initial_fill_done());

    driver.fill_if_no_scroll(true).await;
    assert_eq!(engine.len(), 2);
    assert_eq!(pages.calls(), 2);
}

#[tokio::test]
async fn test_fill_once_without_next_page_stays_pending() {
    let pages = Pages::new(1, 1);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 10.0, 1000.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast());

    driver.fill_if_no_scroll(true).await;

    assert_eq!(engine.len(), 1);
    assert!(!driver.initial_fill_done());
}

#[tokio::test]
async fn test_overlapping_fills_do_not_double_load() {
    let pages = Pages::new(10, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast().threshold(0.0));

    futures::join!(
        driver.fill_if_no_scroll(false),
        driver.fill_if_no_scroll(false)
    );

    assert_eq!(engine.len(), 6);
    assert_eq!(pages.calls(), 3);
}

#[tokio::test]
async fn test_container_geometry_drives_fill() {
    let pages = Pages::new(10, 1);
    let engine = mounted(&pages).await;
    let container = ListViewport::new(&engine, 100.0, 300.0);
    let driver =
        InfiniteScroll::with_container(engine.clone(), tall_window(), container, fast());

    driver.fill_if_no_scroll(false).await;

    // 4 rows of 100px overflow the 300px container
    assert_eq!(engine.len(), 4);
}

// ============================================================================
// Triggers
// ============================================================================

#[tokio::test]
async fn test_scroll_near_bottom_loads_more() {
    let pages = Pages::new(10, 10);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let driver = InfiniteScroll::new(engine.clone(), window.clone(), fast().auto_fill(false));
    driver.attach();

    // 1000px of content, 500px remaining
    driver.on_scroll().await;
    assert_eq!(engine.len(), 10);

    window.scroll_to(350.0);
    driver.on_scroll().await;
    assert_eq!(engine.len(), 20);
}

#[tokio::test]
async fn test_scroll_ignored_while_detached() {
    let pages = Pages::new(10, 10);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    window.scroll_to(500.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast());

    assert_eq!(driver.attachment(), Attachment::Unattached);
    driver.on_scroll().await;

    assert_eq!(engine.len(), 10);
}

#[tokio::test]
async fn test_scroll_mode_ignores_intersections() {
    let pages = Pages::new(10, 10);
    let engine = mounted(&pages).await;
    let driver =
        InfiniteScroll::new(engine.clone(), tall_window(), fast().auto_fill(false));
    driver.attach();

    driver.on_intersection(true).await;

    assert_eq!(engine.len(), 10);
}

#[tokio::test]
async fn test_intersection_mode_ignores_scroll() {
    let pages = Pages::new(10, 10);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    window.scroll_to(500.0);
    let options = ScrollOptions::intersection().delays(Duration::ZERO, Duration::ZERO);
    let driver = InfiniteScroll::new(engine.clone(), window, options);
    driver.attach();

    driver.on_scroll().await;
    assert_eq!(engine.len(), 10);

    driver.on_intersection(false).await;
    assert_eq!(engine.len(), 10);

    driver.on_intersection(true).await;
    assert_eq!(engine.len(), 20);
}

#[tokio::test]
async fn test_intersection_mode_never_auto_fills() {
    let pages = Pages::new(10, 1);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 10.0, 1000.0);
    let options = ScrollOptions::intersection().delays(Duration::ZERO, Duration::ZERO);
    let driver = InfiniteScroll::new(engine.clone(), window, options);

    driver.attach();
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(engine.len(), 1);
    assert_eq!(pages.calls(), 1);
}

// ============================================================================
// Attachment
// ============================================================================

#[tokio::test]
async fn test_attach_fills_after_settle_delay() {
    let pages = Pages::new(10, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast().threshold(0.0));

    driver.attach();
    assert_eq!(driver.attachment(), Attachment::Attached);

    assert!(eventually(|| engine.len() == 6 && !driver.is_filling()).await);
}

#[tokio::test]
async fn test_refill_after_refresh() {
    let pages = Pages::new(10, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast().threshold(0.0));
    driver.attach();
    assert!(eventually(|| engine.len() == 6 && !driver.is_filling()).await);
    let calls = pages.calls();

    engine.refresh().await;

    assert!(eventually(|| pages.calls() >= calls + 3 && engine.len() == 6).await);
}

#[tokio::test]
async fn test_fill_once_attach_does_not_refill() {
    let pages = Pages::new(10, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let driver = InfiniteScroll::new(engine.clone(), window, fast().auto_fill_once(true));
    driver.attach();
    assert!(eventually(|| driver.initial_fill_done()).await);
    assert_eq!(engine.len(), 4);

    engine.refresh().await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    assert_eq!(engine.len(), 2);
}

#[tokio::test]
async fn test_detach_cancels_pending_fill() {
    let pages = Pages::new(10, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let options = ScrollOptions::default().delays(Duration::from_millis(50), Duration::ZERO);
    let driver = InfiniteScroll::new(engine.clone(), window, options);

    driver.attach();
    driver.detach();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(driver.attachment(), Attachment::Unattached);
    assert_eq!(engine.len(), 2);
}

#[tokio::test]
async fn test_drop_detaches() {
    let pages = Pages::new(10, 2);
    let engine = mounted(&pages).await;
    let window = ListViewport::new(&engine, 100.0, 500.0);
    let options = ScrollOptions::default().delays(Duration::from_millis(50), Duration::ZERO);

    {
        let driver = InfiniteScroll::new(engine.clone(), window, options);
        driver.attach();
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(engine.len(), 2);
}

#[tokio::test]
async fn test_debug_output() {
    let pages = Pages::new(1, 1);
    let engine = mounted(&pages).await;
    let driver = InfiniteScroll::new(engine, tall_window(), fast());
    let debug = format!("{driver:?}");
    assert!(debug.contains("InfiniteScroll"));
    assert!(debug.contains("Unattached"));
}
