//! Session diagnostics counters

use serde::{Deserialize, Serialize};

/// Counters published by a session's inbound driver.
///
/// Every malformed or stray frame shows up here instead of as an error, so
/// this is where link-level corruption becomes visible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Raw frames pulled from the source
    pub frames_received: u64,

    /// Frames too short to carry a header
    pub malformed_frames: u64,

    /// Chunks stored into an open transfer
    pub chunks_buffered: u64,

    /// Chunks that replaced an earlier payload with the same sequence
    pub chunks_overwritten: u64,

    /// Transfers sealed into a photo
    pub transfers_completed: u64,

    /// Completion markers for transfers that were not open
    pub stray_markers: u64,

    /// Sealed transfers rejected by the blob transform
    pub transform_failures: u64,

    /// Errors reported by the frame source
    pub source_errors: u64,

    /// Transfers currently accumulating chunks
    pub open_transfers: usize,

    /// Payload bytes held by open transfers
    pub buffered_bytes: usize,

    /// The frame source has ended or the session was closed
    pub ended: bool,
}
