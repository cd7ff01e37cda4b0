//! Photo channel frame decoding
//!
//! Every notification on the photo channel carries a 4-byte header followed
//! by an optional payload:
//!
//! | Offset | Width | Meaning |
//! |---|---|---|
//! | 0-1 | 2 bytes, little-endian | chunk sequence, or `0xFFFF` for "transfer complete" |
//! | 2-3 | 2 bytes | transfer id |
//! | 4.. | variable | chunk payload (absent on completion frames) |

use super::TransferId;
use crate::{LinkError, Result};

/// Length of the fixed frame header.
pub const HEADER_LEN: usize = 4;

/// Sequence value reserved for the completion marker.
pub const COMPLETION_MARKER: u16 = 0xFFFF;

/// A decoded photo channel frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// One piece of a transfer's payload
    Chunk { transfer: TransferId, sequence: u16, payload: Vec<u8> },

    /// No more chunks will follow for this transfer
    Complete { transfer: TransferId },
}

impl FrameEvent {
    /// Decode a raw frame.
    ///
    /// Frames shorter than [`HEADER_LEN`] are rejected with
    /// [`LinkError::MalformedFrame`]. Payload length and content are opaque,
    /// and any tail on a completion frame is ignored.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < HEADER_LEN {
            return Err(LinkError::MalformedFrame { len: frame.len() });
        }

        let transfer = TransferId::from_bytes([frame[2], frame[3]]);
        let sequence = u16::from_le_bytes([frame[0], frame[1]]);

        if sequence == COMPLETION_MARKER {
            return Ok(FrameEvent::Complete { transfer });
        }

        Ok(FrameEvent::Chunk { transfer, sequence, payload: frame[HEADER_LEN..].to_vec() })
    }

    /// Transfer this frame belongs to.
    pub fn transfer(&self) -> TransferId {
        match self {
            FrameEvent::Chunk { transfer, .. } | FrameEvent::Complete { transfer } => *transfer,
        }
    }

    /// Whether this is a completion marker.
    pub fn is_complete(&self) -> bool {
        matches!(self, FrameEvent::Complete { .. })
    }

    /// Encode back into the wire layout.
    ///
    /// A chunk with sequence `0xFFFF` has no wire representation; it encodes
    /// as a completion frame carrying the payload as an ignored tail.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            FrameEvent::Chunk { transfer, sequence, payload } => {
                let mut frame = Vec::with_capacity(HEADER_LEN + payload.len());
                frame.extend_from_slice(&sequence.to_le_bytes());
                frame.extend_from_slice(&transfer.to_bytes());
                frame.extend_from_slice(payload);
                frame
            }
            FrameEvent::Complete { transfer } => {
                let mut frame = Vec::with_capacity(HEADER_LEN);
                frame.extend_from_slice(&COMPLETION_MARKER.to_le_bytes());
                frame.extend_from_slice(&transfer.to_bytes());
                frame
            }
        }
    }
}
