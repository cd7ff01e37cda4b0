//! Append-only sequence of completed photos

use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::watch;
use tracing::trace;

use crate::types::Blob;

/// Ordered, append-only store of completed blobs.
///
/// The multiplexer is the only writer; the scheduler and any number of
/// observers read from cheap clones. The published length only moves
/// forward, and a blob is stored before the length that covers it is
/// published, so `slice(0, len())` never comes up short.
#[derive(Clone)]
pub struct BlobSink {
    inner: Arc<SinkInner>,
}

struct SinkInner {
    blobs: RwLock<Vec<Blob>>,
    len: watch::Sender<usize>,
}

impl Default for BlobSink {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobSink {
    /// Create an empty sink
    pub fn new() -> Self {
        let (len, _) = watch::channel(0);
        Self { inner: Arc::new(SinkInner { blobs: RwLock::new(Vec::new()), len }) }
    }

    /// Append a completed blob, returning its index.
    pub fn append(&self, blob: Blob) -> usize {
        let mut blobs = self.inner.blobs.write().unwrap_or_else(PoisonError::into_inner);
        let index = blobs.len();
        trace!(index, len = blob.len(), "Appending blob");
        blobs.push(blob);
        self.inner.len.send_replace(blobs.len());
        index
    }

    /// Number of blobs appended so far.
    pub fn len(&self) -> usize {
        *self.inner.len.borrow()
    }

    /// Whether no blob has been appended yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blob at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<Blob> {
        let blobs = self.inner.blobs.read().unwrap_or_else(PoisonError::into_inner);
        blobs.get(index).cloned()
    }

    /// Blobs in `[from, to)`, with both bounds clamped to the current length.
    pub fn slice(&self, from: usize, to: usize) -> Vec<Blob> {
        let blobs = self.inner.blobs.read().unwrap_or_else(PoisonError::into_inner);
        let to = to.min(blobs.len());
        let from = from.min(to);
        blobs[from..to].to_vec()
    }

    /// Every blob appended so far.
    pub fn snapshot(&self) -> Vec<Blob> {
        self.slice(0, usize::MAX)
    }

    /// Watch the sink length.
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.inner.len.subscribe()
    }
}

impl std::fmt::Debug for BlobSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobSink").field("len", &self.len()).finish()
    }
}
