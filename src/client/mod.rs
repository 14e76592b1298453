//! Framework-agnostic browsing core.
//!
//! Everything a catalog UI needs that is not rendering: the debounced
//! search stage, the infinite-scroll paginator, and the per-item preview
//! prefetcher. Hosts feed in observed events (input, viewport entry,
//! hover/tap) and apply the emitted commands to their own elements; no
//! UI framework lifecycle leaks in here.

pub mod api;
pub mod debounce;
pub mod paginator;
pub mod poster;
pub mod prefetch;
pub mod sound;
pub mod view;

pub use api::{check_upload_size, CatalogClient, HttpCatalogApi, LinkResolver, CLIENT_MAX_UPLOAD_BYTES};
pub use debounce::{Debouncer, SEARCH_DEBOUNCE};
pub use paginator::{FetchRequest, Paginator, PaginatorPhase, DEFAULT_PAGE_SIZE};
pub use poster::{encode_poster, PosterSource, RawFrame};
pub use prefetch::{CardEvent, CardHandle, Effects, PlayerCommand, PreviewCard, PreviewController};
pub use sound::SoundIntent;
pub use view::{CatalogView, ViewHandle};
