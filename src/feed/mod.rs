//! Status feed adapters.
//!
//! A feed is an append-only, stably ordered list of image references that
//! grows while a query runs. The scroller polls it once per frame and never
//! owns it.

pub mod dir_feed;
pub mod status;

pub use dir_feed::{DirFeedConfig, DirectoryFeed};
pub use status::{QueryState, QueryStatus};

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::models::ImageRef;

/// Read side of a status feed.
pub trait StatusFeed {
    /// Number of references published so far, or `None` while no status has
    /// arrived yet.
    fn available(&self) -> Option<usize>;

    /// Reference at `index`. Indices below `available()` never change.
    fn get(&self, index: usize) -> Option<ImageRef>;

    /// Negative training images reported alongside the positives.
    fn negative_count(&self) -> usize {
        0
    }
}

#[derive(Debug, Default)]
struct FeedState {
    refs: Vec<ImageRef>,
    negative_count: usize,
}

/// A feed that another thread (for example a status poller) writes into.
///
/// Clones share the same underlying list.
#[derive(Debug, Clone, Default)]
pub struct SharedFeed {
    inner: Arc<RwLock<Option<FeedState>>>,
}

impl SharedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// A feed that already holds `refs`.
    pub fn with_refs(refs: impl IntoIterator<Item = ImageRef>) -> Self {
        let feed = Self::new();
        for reference in refs {
            feed.push(reference);
        }
        feed
    }

    /// Appends one reference.
    pub fn push(&self, reference: ImageRef) {
        let mut guard = self.inner.write();
        guard.get_or_insert_with(FeedState::default).refs.push(reference);
    }

    /// Records that a status arrived even if it carries no images yet.
    pub fn mark_received(&self) {
        self.inner.write().get_or_insert_with(FeedState::default);
    }

    /// Replaces the list with the one carried by `status`.
    ///
    /// A status whose list does not extend the current one breaks the
    /// append-only contract; it is logged and ignored.
    pub fn publish(&self, status: &QueryStatus) {
        let refs = status.image_refs();
        let mut guard = self.inner.write();
        let state = guard.get_or_insert_with(FeedState::default);

        if refs.len() < state.refs.len() || refs[..state.refs.len()] != state.refs[..] {
            warn!(
                known = state.refs.len(),
                incoming = refs.len(),
                "Ignoring status that reorders or shrinks the image list"
            );
            return;
        }
        if refs.len() > state.refs.len() {
            debug!(added = refs.len() - state.refs.len(), "Feed grew");
        }
        state.refs = refs;
        state.negative_count = status.negative_count;
    }
}

impl StatusFeed for SharedFeed {
    fn available(&self) -> Option<usize> {
        self.inner.read().as_ref().map(|s| s.refs.len())
    }

    fn get(&self, index: usize) -> Option<ImageRef> {
        self.inner
            .read()
            .as_ref()
            .and_then(|s| s.refs.get(index).cloned())
    }

    fn negative_count(&self) -> usize {
        self.inner.read().as_ref().map_or(0, |s| s.negative_count)
    }
}
