//! Per-transfer chunk accumulation

use std::collections::BTreeMap;

/// Chunks of one open transfer, keyed by sequence number.
///
/// Insertion order is irrelevant; sealing concatenates payloads by
/// ascending sequence. A repeated sequence replaces the earlier payload
/// (last-write-wins), which tolerates retransmission.
#[derive(Debug, Default)]
pub struct TransferBuffer {
    chunks: BTreeMap<u16, Vec<u8>>,
    bytes: usize,
}

impl TransferBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a chunk, returning the payload it replaced, if any.
    pub fn insert(&mut self, sequence: u16, payload: Vec<u8>) -> Option<Vec<u8>> {
        self.bytes += payload.len();
        let replaced = self.chunks.insert(sequence, payload);
        if let Some(old) = &replaced {
            self.bytes -= old.len();
        }
        replaced
    }

    /// Number of distinct sequence numbers held
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total payload bytes held
    pub fn buffered_bytes(&self) -> usize {
        self.bytes
    }

    /// Concatenate all payloads by ascending sequence number.
    ///
    /// An empty buffer seals into an empty blob.
    pub fn seal(self) -> Vec<u8> {
        let mut blob = Vec::with_capacity(self.bytes);
        for payload in self.chunks.into_values() {
            blob.extend_from_slice(&payload);
        }
        blob
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seals_in_sequence_order() {
        let mut buffer = TransferBuffer::new();
        buffer.insert(2, vec![5, 6]);
        buffer.insert(0, vec![1, 2]);
        buffer.insert(1, vec![3, 4]);

        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.buffered_bytes(), 6);
        assert_eq!(buffer.seal(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn duplicate_sequence_keeps_last_payload() {
        let mut buffer = TransferBuffer::new();
        buffer.insert(0, vec![1]);
        assert_eq!(buffer.insert(1, vec![9, 9, 9]), None);
        assert_eq!(buffer.insert(1, vec![2]), Some(vec![9, 9, 9]));

        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.buffered_bytes(), 2);
        assert_eq!(buffer.seal(), vec![1, 2]);
    }

    #[test]
    fn empty_buffer_seals_to_empty_blob() {
        let buffer = TransferBuffer::new();
        assert!(buffer.is_empty());
        assert!(buffer.seal().is_empty());
    }

    #[test]
    fn sequence_gaps_are_not_errors() {
        let mut buffer = TransferBuffer::new();
        buffer.insert(7, vec![7]);
        buffer.insert(3, vec![3]);
        assert_eq!(buffer.seal(), vec![3, 7]);
    }
}
