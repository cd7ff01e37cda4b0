//! Routing of decoded frames to per-transfer buffers

use std::collections::HashMap;
use tracing::{debug, info, trace};

use super::TransferBuffer;
use crate::sink::BlobSink;
use crate::transform::{BlobTransform, Identity};
use crate::types::{Blob, FrameEvent, TransferId};
use crate::{LinkError, Result};

/// What happened to one routed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// A chunk was stored in its open transfer
    Buffered { transfer: TransferId, sequence: u16, replaced: bool },

    /// A transfer was sealed and its blob appended to the sink at `index`
    Sealed { transfer: TransferId, index: usize, len: usize },

    /// A completion marker arrived for a transfer that was not open
    StrayMarker { transfer: TransferId },
}

/// Owns every open transfer of one device session.
///
/// A transfer's buffer is inserted on its first chunk and removed when its
/// completion marker seals it, after which the id is free for reuse. All
/// methods take `&mut self`: frames of one session are handled serially,
/// so no locking is involved.
pub struct TransferMultiplexer {
    open: HashMap<TransferId, TransferBuffer>,
    sink: BlobSink,
    transform: Box<dyn BlobTransform>,
}

impl TransferMultiplexer {
    /// Create a multiplexer that appends untransformed blobs to `sink`
    pub fn new(sink: BlobSink) -> Self {
        Self::with_transform(sink, Identity)
    }

    /// Create a multiplexer that transforms each blob before appending it
    pub fn with_transform(sink: BlobSink, transform: impl BlobTransform) -> Self {
        Self { open: HashMap::new(), sink, transform: Box::new(transform) }
    }

    /// Decode and route one raw frame.
    pub fn accept_frame(&mut self, frame: &[u8]) -> Result<Routed> {
        let event = FrameEvent::decode(frame)?;
        self.route(event)
    }

    /// Route a decoded event to its transfer.
    pub fn route(&mut self, event: FrameEvent) -> Result<Routed> {
        match event {
            FrameEvent::Chunk { transfer, sequence, payload } => {
                Ok(self.on_chunk(transfer, sequence, payload))
            }
            FrameEvent::Complete { transfer } => self.on_complete(transfer),
        }
    }

    /// Store a chunk, opening its transfer if needed.
    pub fn on_chunk(&mut self, transfer: TransferId, sequence: u16, payload: Vec<u8>) -> Routed {
        let len = payload.len();
        let replaced = self.open.entry(transfer).or_default().insert(sequence, payload).is_some();

        if replaced {
            debug!(%transfer, sequence, "Chunk sequence repeated, keeping latest payload");
        } else {
            trace!(%transfer, sequence, len, "Chunk buffered");
        }

        Routed::Buffered { transfer, sequence, replaced }
    }

    /// Open a transfer ahead of its first chunk.
    ///
    /// Returns false if it was already open. A transfer opened this way and
    /// completed without chunks seals into an empty blob.
    pub fn open(&mut self, transfer: TransferId) -> bool {
        if self.open.contains_key(&transfer) {
            return false;
        }
        self.open.insert(transfer, TransferBuffer::new());
        true
    }

    /// Seal a transfer and append its blob to the sink.
    ///
    /// A marker for a transfer that is not open is a no-op. If the transform
    /// rejects the blob, the transfer is still discarded and the error is
    /// returned.
    pub fn on_complete(&mut self, transfer: TransferId) -> Result<Routed> {
        let Some(buffer) = self.open.remove(&transfer) else {
            debug!(%transfer, "Completion marker without open transfer, ignoring");
            return Ok(Routed::StrayMarker { transfer });
        };

        let chunks = buffer.len();
        let blob = Blob::from(buffer.seal());
        let blob = self
            .transform
            .apply(blob)
            .map_err(|source| LinkError::transform_failed(transfer, source))?;

        let len = blob.len();
        let index = self.sink.append(blob);
        info!(%transfer, chunks, len, index, "Photo transfer complete");

        Ok(Routed::Sealed { transfer, index, len })
    }

    /// Number of transfers still accumulating chunks
    pub fn open_transfers(&self) -> usize {
        self.open.len()
    }

    /// Whether `transfer` is currently open
    pub fn is_open(&self, transfer: TransferId) -> bool {
        self.open.contains_key(&transfer)
    }

    /// Payload bytes held across all open transfers
    pub fn buffered_bytes(&self) -> usize {
        self.open.values().map(TransferBuffer::buffered_bytes).sum()
    }

    /// Sink receiving completed blobs
    pub fn sink(&self) -> &BlobSink {
        &self.sink
    }
}
