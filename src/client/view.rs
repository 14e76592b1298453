//! Async driver wiring the debounce stage and the paginator to a catalog
//! transport. The host UI talks to it through a [`ViewHandle`] and observes
//! state through the `on_change` callback passed to [`CatalogView::run`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::debug;

use crate::client::api::CatalogClient;
use crate::client::debounce::{Debouncer, SEARCH_DEBOUNCE};
use crate::client::paginator::{FetchRequest, Paginator};
use crate::models::PageResponse;

#[derive(Debug)]
enum ViewEvent {
    Input(String),
    SentinelVisible,
    PageLoaded { generation: u64, response: PageResponse },
    PageFailed { generation: u64 },
    Shutdown,
}

/// Cloneable handle the host uses to feed observed events into the view.
#[derive(Clone)]
pub struct ViewHandle {
    tx: mpsc::Sender<ViewEvent>,
}

impl ViewHandle {
    /// Raw search-box input; takes effect after the debounce window.
    pub async fn input(&self, text: impl Into<String>) {
        let _ = self.tx.send(ViewEvent::Input(text.into())).await;
    }

    /// The end-of-list sentinel entered the viewport.
    pub async fn sentinel_visible(&self) {
        let _ = self.tx.send(ViewEvent::SentinelVisible).await;
    }

    /// Tear the view down (unmount).
    pub async fn close(&self) {
        let _ = self.tx.send(ViewEvent::Shutdown).await;
    }
}

pub struct CatalogView {
    paginator: Paginator,
    debouncer: Debouncer,
    client: Arc<dyn CatalogClient>,
    events_tx: mpsc::Sender<ViewEvent>,
    events_rx: mpsc::Receiver<ViewEvent>,
}

impl CatalogView {
    pub fn new(client: Arc<dyn CatalogClient>, limit: u32) -> (Self, ViewHandle) {
        Self::with_debounce(client, limit, SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(
        client: Arc<dyn CatalogClient>,
        limit: u32,
        debounce: Duration,
    ) -> (Self, ViewHandle) {
        let (tx, rx) = mpsc::channel(64);
        let view = Self {
            paginator: Paginator::new(limit),
            debouncer: Debouncer::new(debounce),
            client,
            events_tx: tx.clone(),
            events_rx: rx,
        };
        (view, ViewHandle { tx })
    }

    /// Drive the view until the handle closes it. `on_change` fires after
    /// every applied state change so the host can re-render.
    pub async fn run<F>(mut self, mut on_change: F)
    where
        F: FnMut(&Paginator),
    {
        // Initial page load on mount.
        if let Some(request) = self.paginator.start() {
            self.dispatch(request);
            on_change(&self.paginator);
        }

        loop {
            let deadline = self.debouncer.deadline();
            tokio::select! {
                event = self.events_rx.recv() => {
                    let Some(event) = event else { break };
                    if matches!(event, ViewEvent::Shutdown) {
                        break;
                    }
                    self.on_event(event, &mut on_change);
                }
                _ = wait_until(deadline) => {
                    if let Some(term) = self.debouncer.poll(Instant::now()) {
                        debug!(term = %term, "search term committed");
                        if let Some(request) = self.paginator.commit_search(&term) {
                            self.dispatch(request);
                        }
                        on_change(&self.paginator);
                    }
                }
            }
        }
    }

    fn on_event<F>(&mut self, event: ViewEvent, on_change: &mut F)
    where
        F: FnMut(&Paginator),
    {
        match event {
            ViewEvent::Input(text) => {
                self.debouncer.input(text, Instant::now());
            }
            ViewEvent::SentinelVisible => {
                if let Some(request) = self.paginator.sentinel_visible() {
                    self.dispatch(request);
                    on_change(&self.paginator);
                }
            }
            ViewEvent::PageLoaded { generation, response } => {
                if self.paginator.on_page_loaded(generation, response) {
                    on_change(&self.paginator);
                }
            }
            ViewEvent::PageFailed { generation } => {
                if self.paginator.on_page_failed(generation) {
                    on_change(&self.paginator);
                }
            }
            ViewEvent::Shutdown => unreachable!("handled in run"),
        }
    }

    /// One fetch at a time by construction: dispatch is only reachable
    /// through the paginator's loading guard.
    fn dispatch(&self, request: FetchRequest) {
        let client = self.client.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let FetchRequest { generation, term, page, limit } = request;
            let event = match client.fetch_page(&term, page, limit).await {
                Ok(response) => ViewEvent::PageLoaded { generation, response },
                Err(err) => {
                    debug!(error = %err, page, "page fetch failed");
                    ViewEvent::PageFailed { generation }
                }
            };
            let _ = tx.send(event).await;
        });
    }
}

/// Sleep until the debounce deadline; never completes when idle.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => {
            let wait = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(wait).await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::paginator::PaginatorPhase;
    use crate::db::operations::has_more;
    use crate::models::Asset;
    use crate::types::{AppError, AppResult};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// In-memory catalog with the same page math as the server.
    struct FakeCatalog {
        assets: Vec<Asset>,
    }

    impl FakeCatalog {
        fn with_names(names: &[&str]) -> Self {
            let assets = names
                .iter()
                .map(|name| Asset {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    key: format!("assets/{}.mp4", Uuid::new_v4()),
                    size: 1024,
                    media_type: "video/mp4".to_string(),
                    created_at: chrono::Utc::now(),
                    seq: 0,
                })
                .collect();
            Self { assets }
        }
    }

    #[async_trait]
    impl CatalogClient for FakeCatalog {
        async fn fetch_page(&self, term: &str, page: u32, limit: u32) -> AppResult<PageResponse> {
            let matching: Vec<Asset> = self
                .assets
                .iter()
                .filter(|a| term.is_empty() || a.name.contains(term))
                .cloned()
                .collect();
            let total = matching.len() as u64;
            let start = ((page - 1) * limit) as usize;
            let items: Vec<Asset> = matching
                .into_iter()
                .skip(start)
                .take(limit as usize)
                .collect();
            Ok(PageResponse {
                items,
                page,
                limit,
                total,
                has_more: has_more(page, limit, total),
            })
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl CatalogClient for FailingCatalog {
        async fn fetch_page(&self, _: &str, _: u32, _: u32) -> AppResult<PageResponse> {
            Err(AppError::Transport("connection refused".to_string()))
        }
    }

    async fn wait_for<P>(snapshots: &Mutex<Vec<(Vec<String>, PaginatorPhase)>>, predicate: P)
    where
        P: Fn(&[(Vec<String>, PaginatorPhase)]) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if predicate(&snapshots.lock().unwrap()) {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("view never reached the expected state");
    }

    fn spawn_view(
        client: Arc<dyn CatalogClient>,
        limit: u32,
    ) -> (ViewHandle, Arc<Mutex<Vec<(Vec<String>, PaginatorPhase)>>>) {
        let (view, handle) = CatalogView::with_debounce(client, limit, Duration::from_millis(50));
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let sink = snapshots.clone();
        tokio::spawn(view.run(move |paginator| {
            let names = paginator.items().iter().map(|a| a.name.clone()).collect();
            sink.lock().unwrap().push((names, paginator.phase()));
        }));
        (handle, snapshots)
    }

    #[tokio::test]
    async fn test_scrolling_through_all_pages_yields_every_item_once() {
        let names: Vec<String> = (0..25).map(|i| format!("clip-{i:02}")).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let catalog = Arc::new(FakeCatalog::with_names(&name_refs));
        let (handle, snapshots) = spawn_view(catalog, 10);

        // Scroll until exhausted; extra sentinel hits while loading are
        // absorbed by the guard.
        for _ in 0..10 {
            handle.sentinel_visible().await;
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        wait_for(&snapshots, |s| {
            s.last()
                .map(|(items, phase)| items.len() == 25 && *phase == PaginatorPhase::Exhausted)
                .unwrap_or(false)
        })
        .await;

        let (items, _) = snapshots.lock().unwrap().last().cloned().unwrap();
        let mut deduped = items.clone();
        deduped.dedup();
        assert_eq!(items, deduped);
        assert_eq!(items, names);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_debounced_search_resets_the_list() {
        let catalog = Arc::new(FakeCatalog::with_names(&[
            "temple run", "beach day", "temple tour",
        ]));
        let (handle, snapshots) = spawn_view(catalog, 10);

        wait_for(&snapshots, |s| {
            s.last().map(|(items, _)| items.len() == 3).unwrap_or(false)
        })
        .await;

        // Typing burst: only the final value commits.
        handle.input("t").await;
        handle.input("te").await;
        handle.input("temple").await;

        wait_for(&snapshots, |s| {
            s.last()
                .map(|(items, phase)| {
                    items == &["temple run", "temple tour"]
                        && *phase == PaginatorPhase::Exhausted
                })
                .unwrap_or(false)
        })
        .await;

        // The reset cleared the old accumulation before the new page landed.
        let saw_reset = snapshots
            .lock()
            .unwrap()
            .iter()
            .any(|(items, phase)| items.is_empty() && *phase == PaginatorPhase::Loading);
        assert!(saw_reset);
        handle.close().await;
    }

    #[tokio::test]
    async fn test_fetch_failure_halts_pagination() {
        let (handle, snapshots) = spawn_view(Arc::new(FailingCatalog), 10);

        wait_for(&snapshots, |s| {
            s.last().map(|(_, phase)| *phase == PaginatorPhase::Error).unwrap_or(false)
        })
        .await;

        handle.sentinel_visible().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let (_, phase) = snapshots.lock().unwrap().last().cloned().unwrap();
        assert_eq!(phase, PaginatorPhase::Error);
        handle.close().await;
    }
}
