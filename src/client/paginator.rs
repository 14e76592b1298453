use crate::models::{Asset, PageResponse};

/// Page size used by catalog views unless the host overrides it.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Observable phase of the paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorPhase {
    Idle,
    Loading,
    /// The last page arrived; no automatic fetches until the term changes.
    Exhausted,
    /// A page fetch failed; loaded items are preserved, pagination halts.
    Error,
}

/// A page fetch the driver should start. Carries the generation the result
/// must be stamped with so stale responses can be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub term: String,
    pub page: u32,
    pub limit: u32,
}

/// Infinite-scroll state machine for one catalog view.
///
/// At most one fetch is in flight at a time: the loading guard is the
/// backpressure mechanism, not a limitation. A search-term change resets
/// the accumulated state and bumps the generation counter; responses
/// stamped with an older generation are dropped entirely.
#[derive(Debug)]
pub struct Paginator {
    items: Vec<Asset>,
    next_page: u32,
    limit: u32,
    has_more: bool,
    loading: bool,
    failed: bool,
    search: String,
    generation: u64,
}

impl Paginator {
    pub fn new(limit: u32) -> Self {
        Self {
            items: Vec::new(),
            next_page: 1,
            limit,
            has_more: true,
            loading: false,
            failed: false,
            search: String::new(),
            generation: 0,
        }
    }

    /// Request the first page on view mount. Same guard as
    /// [`sentinel_visible`](Self::sentinel_visible).
    pub fn start(&mut self) -> Option<FetchRequest> {
        self.request_next_page()
    }

    /// The end-of-list sentinel entered the viewport (with lookahead).
    pub fn sentinel_visible(&mut self) -> Option<FetchRequest> {
        self.request_next_page()
    }

    /// Commit a debounced search term. A change resets accumulated items,
    /// rewinds to page 1 and invalidates in-flight responses, then starts
    /// the first fetch of the new generation. Committing the current term
    /// again is a no-op.
    pub fn commit_search(&mut self, term: &str) -> Option<FetchRequest> {
        let term = term.trim();
        if term == self.search {
            return None;
        }

        self.search = term.to_string();
        self.items.clear();
        self.next_page = 1;
        self.has_more = true;
        self.failed = false;
        self.loading = false;
        self.generation += 1;

        self.request_next_page()
    }

    fn request_next_page(&mut self) -> Option<FetchRequest> {
        if self.loading || !self.has_more || self.failed {
            return None;
        }
        self.loading = true;
        Some(FetchRequest {
            generation: self.generation,
            term: self.search.clone(),
            page: self.next_page,
            limit: self.limit,
        })
    }

    /// Apply a page response. Returns false when the response belonged to a
    /// stale generation and was discarded without touching any state.
    pub fn on_page_loaded(&mut self, generation: u64, response: PageResponse) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        self.has_more = response.has_more;
        self.next_page += 1;
        self.items.extend(response.items);
        true
    }

    /// Apply a fetch failure. Stale-generation failures are ignored.
    pub fn on_page_failed(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.loading = false;
        self.failed = true;
        true
    }

    pub fn phase(&self) -> PaginatorPhase {
        if self.loading {
            PaginatorPhase::Loading
        } else if self.failed {
            PaginatorPhase::Error
        } else if !self.has_more {
            PaginatorPhase::Exhausted
        } else {
            PaginatorPhase::Idle
        }
    }

    pub fn items(&self) -> &[Asset] {
        &self.items
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }
}
